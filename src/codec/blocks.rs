//! ISO capacity tables, per-symbol block geometry, and the data/ECC
//! interleaver shared by both codec directions.

use crate::codec::reed_solomon;
use crate::error::QrError;
use crate::models::{EcLevel, Version};

// Tables from the QR Code specification (Model 2).
// Index: [ec_level][version]
const ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

const NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Raw data modules available in a version, before dropping remainder bits.
fn num_raw_data_modules(version: Version) -> usize {
    let v = version.number() as usize;
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let numalign = v / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

/// Total codewords carried by a version (remainder bits dropped).
pub fn total_codewords(version: Version) -> usize {
    num_raw_data_modules(version) / 8
}

/// Block geometry for one `(version, ecc)` pair.
///
/// When the data codewords do not divide evenly across blocks, the first
/// `short_blocks` blocks carry `short_block_len` data codewords and the
/// rest carry one more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// ECC codewords appended to every block.
    pub words_per_block: usize,
    /// Number of Reed-Solomon blocks.
    pub num_blocks: usize,
    /// How many blocks are the short kind.
    pub short_blocks: usize,
    /// Data codewords in a short block.
    pub short_block_len: usize,
    /// Payload capacity in bits.
    pub data_bit_capacity: usize,
    /// Data plus ECC codewords for the whole symbol.
    pub total_codewords: usize,
}

impl BlockLayout {
    /// Geometry for a `(version, ecc)` pair from the ISO tables.
    pub fn new(version: Version, ecc: EcLevel) -> Self {
        let idx = ecc.table_index();
        let v = version.number() as usize;
        let words_per_block = ECC_CODEWORDS_PER_BLOCK[idx][v] as usize;
        let num_blocks = NUM_ERROR_CORRECTION_BLOCKS[idx][v] as usize;
        let total = total_codewords(version);
        let data_words = total - words_per_block * num_blocks;
        Self {
            words_per_block,
            num_blocks,
            short_blocks: num_blocks - (data_words % num_blocks),
            short_block_len: data_words / num_blocks,
            data_bit_capacity: data_words * 8,
            total_codewords: total,
        }
    }

    /// Data codewords across all blocks.
    pub fn data_codewords(&self) -> usize {
        self.data_bit_capacity / 8
    }

    /// Data length of block `b` (short blocks come first).
    fn block_len(&self, b: usize) -> usize {
        if b < self.short_blocks {
            self.short_block_len
        } else {
            self.short_block_len + 1
        }
    }
}

/// Split `data` into blocks, append per-block parity, and interleave
/// column-by-column (data first, then ECC).
pub fn interleave(data: &[u8], layout: &BlockLayout) -> Result<Vec<u8>, QrError> {
    if data.len() != layout.data_codewords() {
        return Err(QrError::LayoutMismatch);
    }

    let mut blocks: Vec<&[u8]> = Vec::with_capacity(layout.num_blocks);
    let mut offset = 0;
    for b in 0..layout.num_blocks {
        let len = layout.block_len(b);
        blocks.push(&data[offset..offset + len]);
        offset += len;
    }
    let ecc: Vec<Vec<u8>> = blocks
        .iter()
        .map(|block| reed_solomon::encode(block, layout.words_per_block))
        .collect();

    let mut out = Vec::with_capacity(layout.total_codewords);
    for col in 0..layout.short_block_len + 1 {
        for (b, block) in blocks.iter().enumerate() {
            if col < layout.block_len(b) {
                out.push(block[col]);
            }
        }
    }
    for col in 0..layout.words_per_block {
        for block_ecc in &ecc {
            out.push(block_ecc[col]);
        }
    }
    Ok(out)
}

/// Reverse [`interleave`], run Reed-Solomon correction per block, and
/// concatenate the data portions.
pub fn deinterleave(codewords: &[u8], layout: &BlockLayout) -> Result<Vec<u8>, QrError> {
    if codewords.len() != layout.total_codewords {
        return Err(QrError::LayoutMismatch);
    }

    let mut blocks: Vec<Vec<u8>> = (0..layout.num_blocks)
        .map(|b| vec![0u8; layout.block_len(b) + layout.words_per_block])
        .collect();

    let mut idx = 0;
    for col in 0..layout.short_block_len + 1 {
        for b in 0..layout.num_blocks {
            if col < layout.block_len(b) {
                blocks[b][col] = codewords[idx];
                idx += 1;
            }
        }
    }
    for col in 0..layout.words_per_block {
        for (b, block) in blocks.iter_mut().enumerate() {
            block[layout.block_len(b) + col] = codewords[idx];
            idx += 1;
        }
    }

    let mut data = Vec::with_capacity(layout.data_codewords());
    for (b, block) in blocks.iter_mut().enumerate() {
        reed_solomon::decode(block, layout.words_per_block)?;
        data.extend_from_slice(&block[..layout.block_len(b)]);
    }
    Ok(data)
}
