use thiserror::Error;

/// Everything that can go wrong while encoding or decoding a symbol.
///
/// All failures surface at the entry call; there are no partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    /// Version outside 1..=40.
    #[error("invalid version {0}, expected 1..=40")]
    InvalidVersion(u8),

    /// Mask index outside 0..=7.
    #[error("invalid mask index {0}, expected 0..=7")]
    InvalidMask(u8),

    /// Error-correction level bits do not name a level.
    #[error("invalid error correction level")]
    InvalidEcc,

    /// Segment mode is recognized but not supported on this path.
    #[error("unsupported segment mode")]
    UnsupportedMode,

    /// The payload cannot be represented in the requested segment mode.
    #[error("payload not representable in the requested encoding")]
    InvalidEncoding,

    /// Payload does not fit the chosen version and ECC level.
    #[error("payload needs {bits} bits but capacity is {capacity}")]
    CapacityOverflow { bits: usize, capacity: usize },

    /// Caller-supplied coordinate or size rejected.
    #[error("coordinate or size out of bounds")]
    OutOfBounds,

    /// Decoder input is below the minimum scannable size.
    #[error("image too small, need at least 40x40 pixels")]
    ImageTooSmall,

    /// Decoder input is not 3 or 4 bytes per pixel.
    #[error("unknown pixel format, expected RGB or RGBA")]
    UnknownPixelFormat,

    /// Fewer than three confirmed finder patterns.
    #[error("finder patterns not found")]
    FinderNotFound,

    /// Alignment pattern search exhausted its windows.
    #[error("alignment pattern not found")]
    AlignmentNotFound,

    /// Format information unreadable from either copy.
    #[error("format information unrecoverable")]
    WrongFormatPattern,

    /// Version information unreadable from either copy.
    #[error("version information unrecoverable")]
    WrongVersionPattern,

    /// Reed-Solomon correction failed.
    #[error("too many errors for Reed-Solomon correction")]
    RsUndecodable,

    /// Post-draw invariant violated (unset modules, bad module count).
    #[error("symbol layout mismatch")]
    LayoutMismatch,

    /// Bit stream ended mid-segment or named an unknown mode.
    #[error("malformed segment stream")]
    SegmentParse,
}
