//! In-memory firmware image

use crate::error::{PatchError, PatchResult};
use crate::layout::{TRAILER_LEN, TrailerLayout, VERSION_LEN};

/// A firmware binary held in memory for patching.
///
/// Construction checks that the image can hold a trailer, so the trailer
/// accessors never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    bytes: Vec<u8>,
    layout: TrailerLayout,
}

impl FirmwareImage {
    /// Wrap an image.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::TooShort`] if `bytes` is shorter than the
    /// trailer.
    pub fn new(bytes: Vec<u8>) -> PatchResult<Self> {
        let layout = TrailerLayout::for_len(bytes.len()).ok_or(PatchError::TooShort {
            actual: bytes.len(),
            required: TRAILER_LEN,
        })?;
        Ok(Self { bytes, layout })
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: an image holds at least a trailer.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Trailer field positions for this image.
    pub fn layout(&self) -> &TrailerLayout {
        &self.layout
    }

    /// The image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the image, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn field(&self, range: &std::ops::Range<usize>) -> &[u8] {
        self.bytes.get(range.clone()).unwrap_or_default()
    }

    /// Build timestamp from the trailer.
    pub fn timestamp(&self) -> u32 {
        self.field(&self.layout.timestamp)
            .try_into()
            .map(u32::from_le_bytes)
            .unwrap_or_default()
    }

    /// Raw 32-byte version field.
    pub fn version_field(&self) -> &[u8] {
        self.field(&self.layout.version)
    }

    /// Version tag up to the first NUL, lossily decoded.
    pub fn version_tag(&self) -> String {
        let field = self.version_field();
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        String::from_utf8_lossy(field.get(..end).unwrap_or_default()).into_owned()
    }

    /// Reserved trailer bytes.
    pub fn reserved(&self) -> &[u8] {
        self.field(&self.layout.reserved)
    }

    pub(crate) fn write_timestamp(&mut self, timestamp: u32) {
        if let Some(slot) = self.bytes.get_mut(self.layout.timestamp.clone()) {
            slot.copy_from_slice(&timestamp.to_le_bytes());
        }
    }

    /// Write `version`, NUL-padded, into the version field. The caller has
    /// checked the length.
    pub(crate) fn write_version(&mut self, version: &[u8]) {
        let mut padded = [0u8; VERSION_LEN];
        for (slot, byte) in padded.iter_mut().zip(version) {
            *slot = *byte;
        }
        if let Some(slot) = self.bytes.get_mut(self.layout.version.clone()) {
            slot.copy_from_slice(&padded);
        }
    }

    /// Offsets of every non-overlapping occurrence of `pattern`, scanning from
    /// the start.
    pub fn find_all(&self, pattern: &[u8]) -> Vec<usize> {
        let mut offsets = Vec::new();
        if pattern.is_empty() {
            return offsets;
        }

        let mut pos = 0usize;
        while let Some(window) = self.bytes.get(pos..) {
            match window
                .windows(pattern.len())
                .position(|candidate| candidate == pattern)
            {
                Some(found) => {
                    offsets.push(pos + found);
                    pos += found + pattern.len();
                }
                None => break,
            }
        }
        offsets
    }

    /// Replace every non-overlapping occurrence of `old` with `new`, which
    /// must be the same length. Returns the offsets that were rewritten.
    pub(crate) fn replace_all(&mut self, old: &[u8], new: &[u8]) -> Vec<usize> {
        debug_assert_eq!(old.len(), new.len());
        let offsets = self.find_all(old);
        for &offset in &offsets {
            if let Some(slot) = self.bytes.get_mut(offset..offset + new.len()) {
                slot.copy_from_slice(new);
            }
        }
        offsets
    }
}
