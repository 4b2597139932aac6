use crate::models::{ECLevel, Version};

// ISO/IEC 18004 Model 2 tables. Index: [ec_level][version]
const ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

const NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13,
        14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// How the codewords of one version/level split into Reed-Solomon blocks.
///
/// Short blocks come first; long blocks carry one extra data codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub num_blocks: usize,
    pub ecc_per_block: usize,
    pub num_short_blocks: usize,
    /// Data codewords in a short block
    pub short_data_len: usize,
}

impl BlockLayout {
    pub fn for_symbol(version: Version, ec_level: ECLevel) -> Self {
        let row = ec_level.ordinal();
        let v = version.number() as usize;
        let num_blocks = NUM_ERROR_CORRECTION_BLOCKS[row][v] as usize;
        let ecc_per_block = ECC_CODEWORDS_PER_BLOCK[row][v] as usize;
        let raw_codewords = num_raw_data_modules(version) / 8;
        let num_short_blocks = num_blocks - raw_codewords % num_blocks;
        let short_block_len = raw_codewords / num_blocks;
        Self {
            num_blocks,
            ecc_per_block,
            num_short_blocks,
            short_data_len: short_block_len - ecc_per_block,
        }
    }

    /// Data codewords carried by block `index`
    pub fn data_len(&self, index: usize) -> usize {
        if index < self.num_short_blocks {
            self.short_data_len
        } else {
            self.short_data_len + 1
        }
    }

    pub fn total_data_codewords(&self) -> usize {
        self.short_data_len * self.num_blocks + (self.num_blocks - self.num_short_blocks)
    }

    pub fn total_codewords(&self) -> usize {
        self.total_data_codewords() + self.ecc_per_block * self.num_blocks
    }
}

/// Modules available for data and EC bits (including remainder bits).
pub fn num_raw_data_modules(version: Version) -> usize {
    let v = version.number() as usize;
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

/// Data codewords (after EC is subtracted) for a version and level.
pub fn num_data_codewords(version: Version, ec_level: ECLevel) -> usize {
    BlockLayout::for_symbol(version, ec_level).total_data_codewords()
}

/// Leftover modules after the last full codeword (0, 3, 4 or 7).
pub fn remainder_bits(version: Version) -> usize {
    num_raw_data_modules(version) % 8
}

/// Alignment pattern centers for a given version, ascending.
pub fn alignment_pattern_positions(version: Version) -> Vec<usize> {
    let v = version.number() as usize;
    if v == 1 {
        return Vec::new();
    }
    let num_align = v / 7 + 2;
    let step = (v * 8 + num_align * 3 + 5) / (num_align * 4 - 4) * 2;
    let mut positions: Vec<usize> = (0..num_align - 1)
        .map(|i| version.size() - 7 - i * step)
        .collect();
    positions.push(6);
    positions.reverse();
    positions
}
