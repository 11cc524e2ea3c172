//! Version information recovery.

use crate::codec::bch;
use crate::error::QrError;
use crate::layout;
use crate::models::{Bitmap, Version};

/// Version of a rectified matrix. Below version 7 the geometric size is
/// authoritative; from 7 up the two version fields are read and matched.
pub fn extract(matrix: &Bitmap) -> Result<Version, QrError> {
    let geometric = Version::from_size(matrix.width())?;
    if geometric.number() < 7 {
        return Ok(geometric);
    }
    let (copy_bl, copy_tr) = layout::read_version_copies(matrix);
    bch::match_version(copy_bl, copy_tr)
}
