/// Append-only bit sequence, most significant bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    /// Append the low `len` bits of `value`, MSB first.
    pub fn append_bits(&mut self, value: u32, len: u8) {
        debug_assert!(len <= 32 && (len == 32 || value >> len == 0));
        self.bits
            .extend((0..len).rev().map(|i| (value >> i) & 1 == 1));
    }

    pub fn extend_from(&mut self, other: &BitBuffer) {
        self.bits.extend_from_slice(&other.bits);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Pack into bytes; the length must be a multiple of 8.
    pub fn to_bytes(&self) -> Vec<u8> {
        debug_assert_eq!(self.bits.len() % 8, 0);
        self.bits
            .chunks(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
            .collect()
    }
}
