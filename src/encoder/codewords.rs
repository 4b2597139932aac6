use super::bits::BitBuffer;
use super::segment::{Segment, Segmenter, total_bits};
use super::tables::num_data_codewords;
use crate::error::QrError;
use crate::models::{ECLevel, Version};

/// Segments chosen for a version, with the bits they occupy
#[derive(Debug, Clone)]
pub struct DataPlan {
    pub version: Version,
    pub segments: Vec<Segment>,
    pub data_bits: usize,
}

/// Count-field width class: versions 1-9, 10-26, 27-40
fn width_class(version: Version) -> usize {
    match version.number() {
        1..=9 => 0,
        10..=26 => 1,
        _ => 2,
    }
}

fn raw_bits(segments: &[Segment], version: Version) -> usize {
    segments
        .iter()
        .map(|s| 4 + s.mode().char_count_bits(version) as usize + s.data().len())
        .sum()
}

/// Pick the smallest version whose capacity holds the input, or validate
/// an explicitly requested one.
///
/// Header overhead depends on the version's count-field widths, so the input
/// is re-segmented for each width class as candidates grow.
pub fn select_version(
    segmenter: &Segmenter<'_>,
    prefix: &[Segment],
    ec_level: ECLevel,
    requested: Option<Version>,
) -> Result<DataPlan, QrError> {
    let (first, last) = match requested {
        Some(v) => (v, v),
        None => (Version::MIN, Version::MAX),
    };

    let mut by_class: [Option<Vec<Segment>>; 3] = [None, None, None];
    let mut shortfall = (0usize, 0usize, first);

    for version in first.up_to_max().take_while(|v| *v <= last) {
        let segments = by_class[width_class(version)].get_or_insert_with(|| {
            let mut segs = prefix.to_vec();
            segs.extend(segmenter.segments_for(version));
            segs
        });
        let capacity_bits = num_data_codewords(version, ec_level) * 8;
        match total_bits(segments, version) {
            Some(bits) if bits <= capacity_bits => {
                tracing::debug!(
                    version = version.number(),
                    bits,
                    capacity_bits,
                    segments = segments.len(),
                    "version selected"
                );
                return Ok(DataPlan {
                    version,
                    segments: segments.clone(),
                    data_bits: bits,
                });
            }
            _ => shortfall = (raw_bits(segments, version), capacity_bits, version),
        }
    }

    let (needed_bits, capacity_bits, version) = shortfall;
    Err(QrError::DataTooLarge {
        needed_bits,
        capacity_bits,
        version: version.number(),
    })
}

/// Headers + payloads, terminator, bit padding and pad bytes, exactly
/// filling the data capacity of `version` at `ec_level`.
pub fn build_data_codewords(
    segments: &[Segment],
    version: Version,
    ec_level: ECLevel,
) -> Result<Vec<u8>, QrError> {
    let capacity_bits = num_data_codewords(version, ec_level) * 8;
    let mut bb = BitBuffer::with_capacity(capacity_bits);
    for seg in segments {
        bb.append_bits(seg.mode().indicator(), 4);
        bb.append_bits(seg.num_chars() as u32, seg.mode().char_count_bits(version));
        bb.extend_from(seg.data());
    }
    if bb.len() > capacity_bits {
        return Err(QrError::DataTooLarge {
            needed_bits: bb.len(),
            capacity_bits,
            version: version.number(),
        });
    }

    let terminator = (capacity_bits - bb.len()).min(4);
    bb.append_bits(0, terminator as u8);
    let fill = (8 - bb.len() % 8) % 8;
    bb.append_bits(0, fill as u8);

    for pad in [0xECu32, 0x11].iter().cycle() {
        if bb.len() >= capacity_bits {
            break;
        }
        bb.append_bits(*pad, 8);
    }
    Ok(bb.to_bytes())
}
