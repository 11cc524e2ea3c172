//! Shared symbol-level coding
//!
//! Both the encoder and the decoder go through these modules:
//! - GF(256) arithmetic and dense polynomials
//! - Reed-Solomon parity generation and correction
//! - ISO capacity tables and block interleaving
//! - BCH codes for the format and version fields

/// BCH codes for format/version information
pub mod bch;
/// Capacity tables, block layout, interleaving
pub mod blocks;
/// GF(256) field and polynomial arithmetic
pub mod gf256;
/// Reed-Solomon encoder and decoder
pub mod reed_solomon;
