//! Symbol reader for exact module grids.
//!
//! Recovers the payload from a rendered [`BitMatrix`] (one bit per module,
//! no quiet zone): format information, version information, unmasking,
//! block de-interleaving with an EC check, then segment parsing. It does not
//! locate symbols in photographs and does not correct errors.

/// Zig-zag bit extraction and an MSB-first bit reader
pub mod bitstream;
/// Block de-interleaving and EC verification
pub mod blocks;
/// Segment stream parsing
pub mod segments;

use crate::encoder::format::{decode_format, decode_version, format_bit_positions, version_bit_positions};
use crate::encoder::placement::Canvas;
use crate::encoder::segment::Mode;
use crate::encoder::tables::BlockLayout;
use crate::error::ReadError;
use crate::models::{BitMatrix, ECLevel, MaskPattern, QRCode, Version};

/// Payload and parameters recovered from a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Raw payload bytes, exactly as encoded
    pub data: Vec<u8>,
    /// Payload as text (lossy for non-UTF-8 payloads)
    pub content: String,
    pub version: Version,
    pub error_correction: ECLevel,
    pub mask_pattern: MaskPattern,
    /// Segment modes in stream order
    pub modes: Vec<Mode>,
    /// ECI designator, if the stream carried one
    pub eci: Option<u32>,
}

/// Read a symbol back from its module grid.
pub fn read(modules: &BitMatrix) -> Result<Decoded, ReadError> {
    let (width, height) = (modules.width(), modules.height());
    let version = if width == height {
        Version::from_size(width)
    } else {
        None
    }
    .ok_or(ReadError::InvalidDimension { width, height })?;

    let (error_correction, mask_pattern) = read_format(modules)?;
    if version.number() >= 7 {
        let declared = read_version(modules)?;
        if declared != version {
            return Err(ReadError::VersionInfo);
        }
    }

    let func = Canvas::new(version);
    let mut unmasked = modules.clone();
    for y in 0..width {
        for x in 0..width {
            if !func.is_reserved(x, y) && mask_pattern.is_masked(y, x) {
                unmasked.toggle(x, y);
            }
        }
    }

    let bits = bitstream::extract(&unmasked, &func);
    let codewords = bitstream::bits_to_codewords(&bits);
    let layout = BlockLayout::for_symbol(version, error_correction);
    let data_codewords = blocks::deinterleave_and_check(&codewords, &layout)?;
    let payload = segments::parse(&data_codewords, version)?;

    tracing::debug!(
        version = version.number(),
        ec = %error_correction,
        mask = mask_pattern.index(),
        bytes = payload.bytes.len(),
        "symbol read"
    );

    Ok(Decoded {
        content: String::from_utf8_lossy(&payload.bytes).into_owned(),
        data: payload.bytes,
        version,
        error_correction,
        mask_pattern,
        modes: payload.modes,
        eci: payload.eci,
    })
}

/// Read an encoded [`QRCode`] back, e.g. to verify an encode.
pub fn read_code(code: &QRCode) -> Result<Decoded, ReadError> {
    read(&code.modules)
}

fn read_format(modules: &BitMatrix) -> Result<(ECLevel, MaskPattern), ReadError> {
    let positions = format_bit_positions(modules.width());
    let mut copies = [0u16; 2];
    for (i, pair) in positions.iter().enumerate() {
        for (copy, &(x, y)) in copies.iter_mut().zip(pair) {
            *copy |= u16::from(modules.get(x, y)) << i;
        }
    }
    copies
        .iter()
        .find_map(|&bits| decode_format(bits))
        .ok_or(ReadError::FormatInfo)
}

fn read_version(modules: &BitMatrix) -> Result<Version, ReadError> {
    let positions = version_bit_positions(modules.width());
    let mut copies = [0u32; 2];
    for (i, pair) in positions.iter().enumerate() {
        for (copy, &(x, y)) in copies.iter_mut().zip(pair) {
            *copy |= u32::from(modules.get(x, y)) << i;
        }
    }
    copies
        .iter()
        .find_map(|&bits| decode_version(bits))
        .ok_or(ReadError::VersionInfo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{EncodeOptions, encode, encode_with};

    #[test]
    fn test_read_hello_world() {
        let code = encode(b"HELLO WORLD", ECLevel::Q, None).unwrap();
        let decoded = read_code(&code).unwrap();
        assert_eq!(decoded.content, "HELLO WORLD");
        assert_eq!(decoded.version.number(), 1);
        assert_eq!(decoded.error_correction, ECLevel::Q);
        assert_eq!(decoded.mask_pattern, code.mask_pattern);
    }

    #[test]
    fn test_read_large_version() {
        let text = "https://example.com/".repeat(20);
        let code = encode(text.as_bytes(), ECLevel::H, None).unwrap();
        assert!(code.version.number() >= 7);
        assert_eq!(read_code(&code).unwrap().content, text);
    }

    #[test]
    fn test_read_with_eci() {
        let opts = EncodeOptions::new(ECLevel::M).eci(true);
        let code = encode_with("grüße".as_bytes(), &opts).unwrap();
        let decoded = read_code(&code).unwrap();
        assert_eq!(decoded.eci, Some(26));
        assert_eq!(decoded.content, "grüße");
    }

    #[test]
    fn test_non_square_rejected() {
        let m = BitMatrix::new(21, 25);
        assert_eq!(
            read(&m),
            Err(ReadError::InvalidDimension {
                width: 21,
                height: 25
            })
        );
        assert!(matches!(
            read(&BitMatrix::square(22)),
            Err(ReadError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_blank_grid_has_no_format() {
        assert_eq!(read(&BitMatrix::square(21)), Err(ReadError::FormatInfo));
    }

    #[test]
    fn test_single_module_flip_detected() {
        let mut code = encode(b"checksum", ECLevel::L, Some(1)).unwrap();
        // Bottom-right module is the first data bit
        code.modules.toggle(20, 20);
        assert!(matches!(read_code(&code), Err(ReadError::Checksum { .. })));
    }

    #[test]
    fn test_format_tolerates_flipped_bits() {
        let mut code = encode(b"format", ECLevel::H, None).unwrap();
        let positions = format_bit_positions(code.size());
        for (i, pair) in positions.iter().enumerate().take(3) {
            let (x, y) = pair[i % 2];
            code.modules.toggle(x, y);
        }
        let decoded = read_code(&code).unwrap();
        assert_eq!(decoded.error_correction, ECLevel::H);
        assert_eq!(decoded.content, "format");
    }
}
