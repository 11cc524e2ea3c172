//! Format information recovery.

use crate::codec::bch;
use crate::error::QrError;
use crate::layout;
use crate::models::{Bitmap, EcLevel, Mask};

/// Read both format copies and match them against the 32 candidates.
pub fn extract(matrix: &Bitmap) -> Result<(EcLevel, Mask), QrError> {
    let copy_a = layout::read_format_a(matrix);
    let copy_b = layout::read_format_b(matrix);
    bch::match_format(copy_a, copy_b)
}
