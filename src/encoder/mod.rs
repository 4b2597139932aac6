//! QR code encoding pipeline
//!
//! Select segments → pick version → build data codewords → add Reed-Solomon
//! EC and interleave → place modules → choose mask → overlay format/version.
//! Each stage either succeeds or aborts the whole encode with its error.

/// MSB-first bit buffer
pub mod bits;
/// Version selection and data codeword construction
pub mod codewords;
/// Format and version information (BCH codes and positions)
pub mod format;
/// Mask penalty scoring and selection
pub mod mask;
/// Function patterns and zig-zag data placement
pub mod placement;
/// GF(256) arithmetic and EC codeword generation
pub mod reed_solomon;
/// Mode classification and segmentation
pub mod segment;
/// ISO/IEC 18004 tables (EC blocks, capacities, alignment positions)
pub mod tables;

use crate::error::QrError;
use crate::models::{ECLevel, MaskPattern, QRCode, Version};
use codewords::{build_data_codewords, select_version};
use placement::Canvas;
use segment::{Segment, Segmenter};
use tables::BlockLayout;

pub use segment::Charset;

/// Encoding parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Error correction level (default M)
    pub ec_level: ECLevel,
    /// Fixed version, or `None` for the smallest that fits
    pub version: Option<u8>,
    /// Fixed mask pattern index, or `None` for the lowest-penalty mask
    pub mask: Option<u8>,
    /// How the input bytes are interpreted
    pub charset: Charset,
    /// Prefix an ECI designator for `charset`
    pub eci: bool,
}

impl EncodeOptions {
    pub fn new(ec_level: ECLevel) -> Self {
        Self {
            ec_level,
            ..Self::default()
        }
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }

    pub fn mask(mut self, mask: u8) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn eci(mut self, eci: bool) -> Self {
        self.eci = eci;
        self
    }
}

/// Encode UTF-8 text at `ec_level`, optionally forcing a version.
pub fn encode(data: &[u8], ec_level: ECLevel, version: Option<u8>) -> Result<QRCode, QrError> {
    encode_with(
        data,
        &EncodeOptions {
            ec_level,
            version,
            ..EncodeOptions::default()
        },
    )
}

/// Encode `data` with full control over version, mask and character set.
pub fn encode_with(data: &[u8], options: &EncodeOptions) -> Result<QRCode, QrError> {
    let requested = options.version.map(Version::new).transpose()?;
    let fixed_mask = options.mask.map(MaskPattern::new).transpose()?;

    if data.is_empty() {
        return Err(QrError::EmptyInput);
    }
    let segmenter = Segmenter::new(data, options.charset)?;

    let mut prefix = Vec::new();
    if options.eci {
        prefix.push(Segment::eci(options.charset.eci_designator())?);
    }

    let plan = select_version(&segmenter, &prefix, options.ec_level, requested)?;
    tracing::debug!(
        version = plan.version.number(),
        modes = ?plan.segments.iter().map(|s| s.mode()).collect::<Vec<_>>(),
        "segments chosen"
    );
    encode_segments(&plan.segments, plan.version, options.ec_level, fixed_mask)
}

/// Run the back half of the pipeline for prepared segments at a known version.
pub fn encode_segments(
    segments: &[Segment],
    version: Version,
    ec_level: ECLevel,
    fixed_mask: Option<MaskPattern>,
) -> Result<QRCode, QrError> {
    let data_codewords = build_data_codewords(segments, version, ec_level)?;
    let layout = BlockLayout::for_symbol(version, ec_level);
    let all_codewords = reed_solomon::add_ecc_and_interleave(&data_codewords, &layout);

    let mut canvas = Canvas::new(version);
    canvas.draw_codewords(&all_codewords);

    let mask_pattern = match fixed_mask {
        Some(mask) => mask,
        None => {
            let penalties = mask::evaluate_masks(&canvas, ec_level);
            let chosen = mask::select_mask(&penalties);
            tracing::debug!(?penalties, mask = chosen.index(), "mask selected");
            chosen
        }
    };
    canvas.apply_mask(mask_pattern);
    format::write_format(&mut canvas, ec_level, mask_pattern);

    Ok(QRCode {
        version,
        error_correction: ec_level,
        mask_pattern,
        modules: canvas.into_modules(),
    })
}
