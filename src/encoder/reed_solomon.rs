/// Reed-Solomon error correction for QR codes
/// QR codes use RS over GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
use super::tables::BlockLayout;

const PRIMITIVE: u16 = 0x11D;

struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
}

const fn build_tables() -> Tables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    // Doubled so exp[log a + log b] never needs a modulo
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    Tables { exp, log }
}

static TABLES: Tables = build_tables();

/// GF(256) field operations using log/exp tables
pub struct Gf256;

impl Gf256 {
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = TABLES.log[a as usize] as usize;
        let log_b = TABLES.log[b as usize] as usize;
        TABLES.exp[log_a + log_b]
    }

    /// alpha^n
    pub fn exp(n: usize) -> u8 {
        TABLES.exp[n % 255]
    }
}

/// Generator polynomial of the given degree, coefficients from x^(d-1) down
/// to x^0 (the monic leading term is implicit).
pub fn generator_polynomial(degree: usize) -> Vec<u8> {
    assert!((1..=255).contains(&degree), "degree out of range");
    let mut result = vec![0u8; degree];
    result[degree - 1] = 1;
    let mut root = 1u8;
    for _ in 0..degree {
        // Multiply by (x - root)
        for j in 0..degree {
            result[j] = Gf256::mul(result[j], root);
            if j + 1 < degree {
                result[j] ^= result[j + 1];
            }
        }
        root = Gf256::mul(root, 0x02);
    }
    result
}

/// Remainder of data(x) * x^d divided by the generator polynomial.
pub fn remainder(data: &[u8], generator: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; generator.len()];
    for &b in data {
        let factor = b ^ result[0];
        result.rotate_left(1);
        if let Some(last) = result.last_mut() {
            *last = 0;
        }
        for (r, &g) in result.iter_mut().zip(generator) {
            *r ^= Gf256::mul(g, factor);
        }
    }
    result
}

/// Split data codewords into blocks, append EC codewords to each, and
/// interleave: data column by column, then EC column by column.
pub fn add_ecc_and_interleave(data: &[u8], layout: &BlockLayout) -> Vec<u8> {
    debug_assert_eq!(data.len(), layout.total_data_codewords());
    let generator = generator_polynomial(layout.ecc_per_block);

    let mut data_blocks: Vec<&[u8]> = Vec::with_capacity(layout.num_blocks);
    let mut ecc_blocks: Vec<Vec<u8>> = Vec::with_capacity(layout.num_blocks);
    let mut offset = 0;
    for i in 0..layout.num_blocks {
        let len = layout.data_len(i);
        let block = &data[offset..offset + len];
        ecc_blocks.push(remainder(block, &generator));
        data_blocks.push(block);
        offset += len;
    }

    let mut result = Vec::with_capacity(layout.total_codewords());
    for col in 0..=layout.short_data_len {
        for block in &data_blocks {
            if let Some(&b) = block.get(col) {
                result.push(b);
            }
        }
    }
    for col in 0..layout.ecc_per_block {
        for ecc in &ecc_blocks {
            result.push(ecc[col]);
        }
    }
    result
}

/// Evaluate the syndromes of a received block (data followed by EC).
/// All zero means the block is a valid codeword.
pub fn syndromes(block: &[u8], ecc_len: usize) -> Vec<u8> {
    (0..ecc_len)
        .map(|i| {
            block
                .iter()
                .fold(0u8, |acc, &c| Gf256::mul(acc, Gf256::exp(i)) ^ c)
        })
        .collect()
}
