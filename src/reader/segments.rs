//! Segment stream parsing.
//!
//! Walks mode indicator / count / payload triples until the terminator or the
//! end of the data codewords. Payloads are decoded back to the bytes that were
//! encoded: digits and alphanumeric characters as ASCII, kanji as Shift JIS.

use super::bitstream::BitReader;
use crate::encoder::segment::{ALPHANUMERIC_CHARSET, Mode};
use crate::error::ReadError;
use crate::models::Version;

/// Payload recovered from the segment stream
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub modes: Vec<Mode>,
    /// Last ECI designator seen, if any
    pub eci: Option<u32>,
}

fn truncated(mode: Mode) -> ReadError {
    ReadError::Segment(format!("{mode:?} segment runs past the end of the data"))
}

pub fn parse(data: &[u8], version: Version) -> Result<Payload, ReadError> {
    let mut reader = BitReader::new(data);
    let mut payload = Payload::default();

    while reader.remaining() >= 4 {
        let indicator = reader.read(4).unwrap_or(0);
        if indicator == 0 {
            break;
        }
        let mode = Mode::from_indicator(indicator)
            .ok_or_else(|| ReadError::Segment(format!("unknown mode indicator {indicator:#06b}")))?;
        payload.modes.push(mode);

        match mode {
            Mode::Eci => payload.eci = Some(read_eci(&mut reader)?),
            Mode::Numeric => {
                let count = read_count(&mut reader, mode, version)?;
                read_numeric(&mut reader, count, &mut payload.bytes)?;
            }
            Mode::Alphanumeric => {
                let count = read_count(&mut reader, mode, version)?;
                read_alphanumeric(&mut reader, count, &mut payload.bytes)?;
            }
            Mode::Byte => {
                let count = read_count(&mut reader, mode, version)?;
                for _ in 0..count {
                    let b = reader.read(8).ok_or_else(|| truncated(mode))?;
                    payload.bytes.push(b as u8);
                }
            }
            Mode::Kanji => {
                let count = read_count(&mut reader, mode, version)?;
                read_kanji(&mut reader, count, &mut payload.bytes)?;
            }
        }
    }

    Ok(payload)
}

fn read_count(reader: &mut BitReader, mode: Mode, version: Version) -> Result<usize, ReadError> {
    let width = usize::from(mode.char_count_bits(version));
    reader.read(width).map(|c| c as usize).ok_or_else(|| truncated(mode))
}

/// 1, 2 or 3 byte designator, length signalled by the leading bits
fn read_eci(reader: &mut BitReader) -> Result<u32, ReadError> {
    let first = reader.read(8).ok_or_else(|| truncated(Mode::Eci))?;
    if first & 0x80 == 0 {
        Ok(first & 0x7F)
    } else if first & 0xC0 == 0x80 {
        let rest = reader.read(8).ok_or_else(|| truncated(Mode::Eci))?;
        Ok((first & 0x3F) << 8 | rest)
    } else if first & 0xE0 == 0xC0 {
        let rest = reader.read(16).ok_or_else(|| truncated(Mode::Eci))?;
        Ok((first & 0x1F) << 16 | rest)
    } else {
        Err(ReadError::Segment(format!("invalid ECI designator prefix {first:#04x}")))
    }
}

fn read_numeric(reader: &mut BitReader, count: usize, out: &mut Vec<u8>) -> Result<(), ReadError> {
    let mut left = count;
    while left > 0 {
        let digits = left.min(3);
        let (width, limit) = match digits {
            3 => (10, 999),
            2 => (7, 99),
            _ => (4, 9),
        };
        let value = reader.read(width).ok_or_else(|| truncated(Mode::Numeric))?;
        if value > limit {
            return Err(ReadError::Segment(format!("numeric group {value} out of range")));
        }
        let text = format!("{value:0digits$}");
        out.extend_from_slice(text.as_bytes());
        left -= digits;
    }
    Ok(())
}

fn alphanumeric_char(code: u32) -> Result<u8, ReadError> {
    ALPHANUMERIC_CHARSET
        .get(code as usize)
        .copied()
        .ok_or_else(|| ReadError::Segment(format!("alphanumeric code {code} out of range")))
}

fn read_alphanumeric(reader: &mut BitReader, count: usize, out: &mut Vec<u8>) -> Result<(), ReadError> {
    for _ in 0..count / 2 {
        let value = reader.read(11).ok_or_else(|| truncated(Mode::Alphanumeric))?;
        out.push(alphanumeric_char(value / 45)?);
        out.push(alphanumeric_char(value % 45)?);
    }
    if count % 2 == 1 {
        let value = reader.read(6).ok_or_else(|| truncated(Mode::Alphanumeric))?;
        out.push(alphanumeric_char(value)?);
    }
    Ok(())
}

fn read_kanji(reader: &mut BitReader, count: usize, out: &mut Vec<u8>) -> Result<(), ReadError> {
    for _ in 0..count {
        let value = reader.read(13).ok_or_else(|| truncated(Mode::Kanji))?;
        let packed = (value / 0xC0) << 8 | (value % 0xC0);
        let sjis = if packed < 0x1F00 {
            packed + 0x8140
        } else {
            packed + 0xC140
        };
        out.push((sjis >> 8) as u8);
        out.push(sjis as u8);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::bits::BitBuffer;
    use crate::encoder::segment::{Segment, kanji_value};

    fn stream(segments: &[Segment], version: Version) -> Vec<u8> {
        let mut bb = BitBuffer::new();
        for seg in segments {
            bb.append_bits(seg.mode().indicator(), 4);
            let cc = seg.mode().char_count_bits(version);
            if cc > 0 {
                bb.append_bits(seg.num_chars() as u32, cc);
            }
            bb.extend_from(seg.data());
        }
        bb.append_bits(0, 4);
        let fill = (8 - bb.len() % 8) % 8;
        bb.append_bits(0, fill as u8);
        bb.to_bytes()
    }

    #[test]
    fn test_mixed_segments() {
        let v = Version::new(1).unwrap();
        let segs = [
            Segment::numeric(b"0123456").unwrap(),
            Segment::alphanumeric(b"AC-42").unwrap(),
            Segment::bytes(b"hi!"),
        ];
        let payload = parse(&stream(&segs, v), v).unwrap();
        assert_eq!(payload.bytes, b"0123456AC-42hi!");
        assert_eq!(
            payload.modes,
            vec![Mode::Numeric, Mode::Alphanumeric, Mode::Byte]
        );
    }

    #[test]
    fn test_leading_zero_digits_kept() {
        let v = Version::new(1).unwrap();
        let payload = parse(&stream(&[Segment::numeric(b"00701").unwrap()], v), v).unwrap();
        assert_eq!(payload.bytes, b"00701");
    }

    #[test]
    fn test_kanji_and_eci() {
        let v = Version::new(12).unwrap();
        let values = [kanji_value(0x93, 0x5F).unwrap(), kanji_value(0xE4, 0xAA).unwrap()];
        let segs = [Segment::eci(20).unwrap(), Segment::kanji(&values)];
        let payload = parse(&stream(&segs, v), v).unwrap();
        assert_eq!(payload.eci, Some(20));
        assert_eq!(payload.bytes, vec![0x93, 0x5F, 0xE4, 0xAA]);
    }

    #[test]
    fn test_multi_byte_eci_designator() {
        let v = Version::new(1).unwrap();
        let payload = parse(&stream(&[Segment::eci(900).unwrap()], v), v).unwrap();
        assert_eq!(payload.eci, Some(900));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let v = Version::new(1).unwrap();
        assert!(matches!(parse(&[0b0011_0000], v), Err(ReadError::Segment(_))));
    }

    #[test]
    fn test_truncated_byte_segment() {
        let v = Version::new(1).unwrap();
        // Byte mode, count 5, only one data byte follows
        let data = [0b0100_0000, 0b0101_0110, 0b0001_0000];
        assert!(matches!(parse(&data, v), Err(ReadError::Segment(_))));
    }
}
