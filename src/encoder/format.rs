/// Format information (BCH(15,5)) and version information (BCH(18,6))
use super::placement::Canvas;
use crate::models::{ECLevel, MaskPattern, Version};

/// BCH(15,5) generator: x^10 + x^8 + x^5 + x^4 + x^2 + x + 1
const FORMAT_GENERATOR: u32 = 0x537;
/// XOR mask so format info is never all zero
const FORMAT_MASK: u16 = 0x5412;
/// BCH(18,6) generator: x^12 + x^11 + x^10 + x^9 + x^8 + x^5 + x^2 + 1
const VERSION_GENERATOR: u32 = 0x1F25;

/// 15-bit masked format information for a level and mask
pub fn format_bits(ec_level: ECLevel, mask: MaskPattern) -> u16 {
    let data = u32::from(ec_level.format_bits() << 3 | mask.index());
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * FORMAT_GENERATOR);
    }
    ((data << 10 | rem) as u16) ^ FORMAT_MASK
}

/// 18-bit version information (versions 7-40)
pub fn version_bits(version: Version) -> u32 {
    let data = u32::from(version.number());
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * VERSION_GENERATOR);
    }
    data << 12 | rem
}

/// (x, y) of format bit `i` (LSB = 0) in both copies: around the top-left
/// finder, and split between the top-right and bottom-left finders.
pub fn format_bit_positions(size: usize) -> [[(usize, usize); 2]; 15] {
    let mut positions = [[(0, 0); 2]; 15];
    for (i, slot) in positions.iter_mut().enumerate() {
        let first = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        let second = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
        *slot = [first, second];
    }
    positions
}

/// (x, y) of version bit `i` in the top-right and bottom-left 6x3 blocks
pub fn version_bit_positions(size: usize) -> [[(usize, usize); 2]; 18] {
    let mut positions = [[(0, 0); 2]; 18];
    for (i, slot) in positions.iter_mut().enumerate() {
        let a = size - 11 + i % 3;
        let b = i / 3;
        *slot = [(a, b), (b, a)];
    }
    positions
}

pub(crate) fn draw_format_bits(canvas: &mut Canvas, bits: u16) {
    let size = canvas.size();
    for (i, copies) in format_bit_positions(size).iter().enumerate() {
        let dark = (bits >> i) & 1 == 1;
        for &(x, y) in copies {
            canvas.set_function(x, y, dark);
        }
    }
    // Always-dark module beside the bottom-left finder
    canvas.set_function(8, size - 8, true);
}

pub(crate) fn draw_version_bits(canvas: &mut Canvas) {
    let version = canvas.version();
    if version.number() < 7 {
        return;
    }
    let bits = version_bits(version);
    for (i, copies) in version_bit_positions(canvas.size()).iter().enumerate() {
        let dark = (bits >> i) & 1 == 1;
        for &(x, y) in copies {
            canvas.set_function(x, y, dark);
        }
    }
}

/// Overlay the final format information for `ec_level` and `mask`
pub fn write_format(canvas: &mut Canvas, ec_level: ECLevel, mask: MaskPattern) {
    draw_format_bits(canvas, format_bits(ec_level, mask));
}

/// Closest valid format word within BCH(15,5)'s correction radius of 3
pub fn decode_format(bits: u16) -> Option<(ECLevel, MaskPattern)> {
    ECLevel::ALL
        .iter()
        .flat_map(|&ec| MaskPattern::ALL.iter().map(move |&mask| (ec, mask)))
        .map(|(ec, mask)| ((format_bits(ec, mask) ^ bits).count_ones(), ec, mask))
        .min_by_key(|&(distance, _, _)| distance)
        .filter(|&(distance, _, _)| distance <= 3)
        .map(|(_, ec, mask)| (ec, mask))
}

/// Closest valid version word within BCH(18,6)'s correction radius of 3
pub fn decode_version(bits: u32) -> Option<Version> {
    Version::new(7)
        .ok()?
        .up_to_max()
        .map(|v| ((version_bits(v) ^ bits).count_ones(), v))
        .min_by_key(|&(distance, _)| distance)
        .filter(|&(distance, _)| distance <= 3)
        .map(|(_, v)| v)
}
