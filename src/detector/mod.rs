//! Symbol detection in binarized images
//!
//! Finder pattern scanning, alignment pattern search, and perspective
//! rectification onto the module grid.

/// Alignment pattern search
pub mod alignment;
/// Finder pattern scanning
pub mod finder;
/// Perspective transform and grid sampling
pub mod transform;

pub use finder::{FinderDetector, PatternHit};
pub use transform::PerspectiveTransform;
