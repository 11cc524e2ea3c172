//! Core data structures for symbol processing
//!
//! This module defines the main types used throughout the library:
//! - Bitmap: tri-state bit-packed module matrix
//! - Point/Vector: coordinates and displacements for geometry
//! - Version, EcLevel, Mask, SegmentMode: symbol metadata
//! - Decoded: result type carrying recovered text and metadata

pub mod matrix;
pub mod point;
pub mod types;

pub use matrix::{Bitmap, Module};
pub use point::{Point, Vector};
pub use types::{Decoded, EcLevel, Mask, Segment, SegmentMode, Version};
