//! Utility functions (grayscale conversion, binarization)

pub mod binarization;
pub mod grayscale;
