//! Symbol decoding
//!
//! Everything after rectification lives here: format and version
//! recovery, data readout, and segment parsing. The image-side stages
//! (binarization, detection, perspective) are in `detector` and `utils`.

/// Format information recovery
pub mod format;
/// Segment payload parsers (numeric, alphanumeric, byte)
pub mod modes;
/// Matrix-to-text decoding pipeline
pub mod qr_decoder;
/// Version information recovery
pub mod version;
