use crate::encoder::reed_solomon::syndromes;
use crate::encoder::tables::BlockLayout;
use crate::error::ReadError;

/// Undo block interleaving and verify every block's EC codewords.
///
/// Returns the data codewords in block order. The reader works on exact
/// module grids, so any non-zero syndrome is reported rather than corrected.
pub fn deinterleave_and_check(codewords: &[u8], layout: &BlockLayout) -> Result<Vec<u8>, ReadError> {
    if codewords.len() < layout.total_codewords() {
        return Err(ReadError::Checksum { block: 0 });
    }

    let mut blocks: Vec<Vec<u8>> = (0..layout.num_blocks)
        .map(|i| Vec::with_capacity(layout.data_len(i) + layout.ecc_per_block))
        .collect();

    let mut idx = 0;
    for col in 0..=layout.short_data_len {
        for (b, block) in blocks.iter_mut().enumerate() {
            if col < layout.data_len(b) {
                block.push(codewords[idx]);
                idx += 1;
            }
        }
    }
    for _ in 0..layout.ecc_per_block {
        for block in blocks.iter_mut() {
            block.push(codewords[idx]);
            idx += 1;
        }
    }

    let mut data = Vec::with_capacity(layout.total_data_codewords());
    for (b, block) in blocks.iter().enumerate() {
        if syndromes(block, layout.ecc_per_block).iter().any(|&s| s != 0) {
            return Err(ReadError::Checksum { block: b });
        }
        data.extend_from_slice(&block[..layout.data_len(b)]);
    }
    Ok(data)
}
