//! Resource pack codec.
//!
//! A resource pack is the binary container the device loads images, fonts and
//! strings from. All integers are little-endian:
//!
//! | Offset   | Field                                                  |
//! |----------|--------------------------------------------------------|
//! | `0x00`   | resource count (`u32`)                                 |
//! | `0x04`   | checksum of the data region (`u32`)                    |
//! | `0x08`   | zero                                                   |
//! | `0x0C`   | table, 16 bytes per entry: index, offset, size, checksum |
//! | `0x200C` | resource data, contiguous, in index order              |
//!
//! The whole-pack checksum covers the data region only, from `0x200C` to the
//! end of the file. The firmware keeps its own copy of that value, which is
//! why rebuilding a pack forces a firmware patch.
//!
//! Verification on decode is advisory: the device loader tolerates checksum
//! mismatches, so [`decode`] records them in a [`VerificationReport`] and
//! keeps going. A pack with no resources may stop after the header fields.
//! Structural damage (a truncated header, a table entry that
//! points outside the file) is an error.

#![deny(static_mut_refs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod files;
pub mod pack;
pub mod report;

pub use decode::{DecodedPack, decode, header_checksum_bytes};
pub use encode::encode;
pub use error::{PackError, PackResult};
pub use files::{extract, load_dir};
pub use pack::{ResourceEntry, ResourcePack};
pub use report::{ChecksumCheck, EntryCheck, VerificationReport};

/// Offset of the resource count field.
pub const COUNT_OFFSET: usize = 0x00;
/// Offset of the data-region checksum field.
pub const CHECKSUM_OFFSET: usize = 0x04;
/// Length of the count and checksum fields, the smallest valid pack.
pub const HEADER_LEN: usize = 0x08;
/// Offset of the first table entry.
pub const TABLE_OFFSET: usize = 0x0C;
/// Offset of the first byte of resource data.
pub const DATA_OFFSET: usize = 0x200C;
/// Size of one table entry in bytes.
pub const ENTRY_SIZE: usize = 16;
/// Number of entries that fit between the table and data offsets.
pub const MAX_ENTRIES: usize = (DATA_OFFSET - TABLE_OFFSET) / ENTRY_SIZE;
/// Largest data region addressable by the signed 32-bit table offsets.
pub const MAX_DATA_LEN: u64 = i32::MAX as u64;

pub(crate) fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

pub(crate) fn read_i32(buf: &[u8], at: usize) -> Option<i32> {
    read_u32(buf, at).map(|value| i32::from_le_bytes(value.to_le_bytes()))
}

pub(crate) fn write_u32(buf: &mut [u8], at: usize, value: u32) -> bool {
    match at.checked_add(4).and_then(|end| buf.get_mut(at..end)) {
        Some(slot) => {
            slot.copy_from_slice(&value.to_le_bytes());
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_capacity_is_512_entries() {
        assert_eq!(MAX_ENTRIES, 512);
    }

    #[test]
    fn read_u32_out_of_range_is_none() {
        assert_eq!(read_u32(&[1, 2, 3], 0), None);
        assert_eq!(read_u32(&[1, 2, 3, 4], usize::MAX), None);
    }

    #[test]
    fn read_i32_is_signed() {
        assert_eq!(read_i32(&[0xFF, 0xFF, 0xFF, 0xFF], 0), Some(-1));
    }

    #[test]
    fn write_u32_rejects_short_buffer() {
        let mut buf = [0u8; 3];
        assert!(!write_u32(&mut buf, 0, 7));
    }
}
