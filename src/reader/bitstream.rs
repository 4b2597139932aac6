/// Bitstream extraction from an unmasked module matrix
use crate::encoder::placement::Canvas;
use crate::models::BitMatrix;

/// Read data bits in placement order, skipping function modules.
///
/// Mirrors the encoder's traversal: column pairs from the right edge,
/// alternating upward/downward, column 6 (vertical timing) skipped.
pub fn extract(matrix: &BitMatrix, func: &Canvas) -> Vec<bool> {
    let dimension = matrix.width();
    let mut bits = Vec::with_capacity(func.data_modules_count());
    let mut upward = true;
    let mut col = dimension as i32 - 1;

    while col > 0 {
        if col == 6 {
            col -= 1;
            continue;
        }
        for step in 0..dimension {
            let row = if upward { dimension - 1 - step } else { step };
            for c in [col as usize, col as usize - 1] {
                if !func.is_reserved(c, row) {
                    bits.push(matrix.get(c, row));
                }
            }
        }
        upward = !upward;
        col -= 2;
    }

    bits
}

/// Pack bits MSB-first into whole codewords, dropping remainder bits
pub fn bits_to_codewords(bits: &[bool]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
        .collect()
}

/// Sequential MSB-first reader over codeword bytes
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }

    /// Read `len` (<= 32) bits, or `None` if the stream is exhausted
    pub fn read(&mut self, len: usize) -> Option<u32> {
        if len > self.remaining() {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..len {
            let byte = self.bytes[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.pos += 1;
        }
        Some(value)
    }
}
