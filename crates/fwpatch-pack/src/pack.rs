//! Decoded resource pack model

use serde::Serialize;

/// One resource as described by the pack table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    index: i32,
    offset: i32,
    size: i32,
    checksum: u32,
    #[serde(skip)]
    data: Vec<u8>,
}

impl ResourceEntry {
    pub(crate) fn new(index: i32, offset: i32, size: i32, checksum: u32, data: Vec<u8>) -> Self {
        Self {
            index,
            offset,
            size,
            checksum,
            data,
        }
    }

    /// 1-based resource index stored in the table.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Byte offset of the data within the data region.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Length of the data in bytes.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Checksum stored in the table (not recomputed).
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Resource bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the resource bytes contain `needle`. An empty needle never
    /// matches.
    pub fn contains(&self, needle: &[u8]) -> bool {
        !needle.is_empty() && self.data.windows(needle.len()).any(|window| window == needle)
    }
}

/// A pack read back from its binary form.
///
/// Packs are never edited in place: to change a resource, take the blobs out
/// with [`ResourcePack::into_resources`] and [`encode`](crate::encode) a new
/// pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourcePack {
    whole_checksum: u32,
    entries: Vec<ResourceEntry>,
}

impl ResourcePack {
    pub(crate) fn new(whole_checksum: u32, entries: Vec<ResourceEntry>) -> Self {
        Self {
            whole_checksum,
            entries,
        }
    }

    /// Number of resources.
    pub fn resource_count(&self) -> usize {
        self.entries.len()
    }

    /// Data-region checksum stored in the header.
    pub fn whole_checksum(&self) -> u32 {
        self.whole_checksum
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    /// Resource blobs in table order.
    pub fn resources(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(ResourceEntry::data)
    }

    /// Consume the pack, keeping only the blobs.
    pub fn into_resources(self) -> Vec<Vec<u8>> {
        self.entries.into_iter().map(|entry| entry.data).collect()
    }
}
