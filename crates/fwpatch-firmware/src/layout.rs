//! Firmware trailer layout
//!
//! The trailer is the last [`TRAILER_LEN`] bytes of the image:
//!
//! | From end    | Field                                   |
//! |-------------|-----------------------------------------|
//! | `-47..-43`  | build timestamp, `u32` little-endian    |
//! | `-43..-11`  | version tag, ASCII, NUL-padded to 32    |
//! | `-11..`     | reserved, never written                 |

use std::ops::Range;

/// Size of the timestamp field.
pub const TIMESTAMP_LEN: usize = 4;
/// Size of the version tag field.
pub const VERSION_LEN: usize = 32;
/// Size of the reserved tail.
pub const RESERVED_LEN: usize = 11;
/// Total trailer size.
pub const TRAILER_LEN: usize = TIMESTAMP_LEN + VERSION_LEN + RESERVED_LEN;

/// Absolute byte ranges of the trailer fields for one image length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerLayout {
    /// Build timestamp
    pub timestamp: Range<usize>,
    /// Version tag
    pub version: Range<usize>,
    /// Reserved bytes
    pub reserved: Range<usize>,
}

impl TrailerLayout {
    /// Layout for an image of `len` bytes, or `None` if it cannot hold a
    /// trailer.
    pub fn for_len(len: usize) -> Option<Self> {
        let start = len.checked_sub(TRAILER_LEN)?;
        let version_start = start + TIMESTAMP_LEN;
        let reserved_start = version_start + VERSION_LEN;
        Some(Self {
            timestamp: start..version_start,
            version: version_start..reserved_start,
            reserved: reserved_start..len,
        })
    }

    /// Offset of the first trailer byte.
    pub fn start(&self) -> usize {
        self.timestamp.start
    }
}
