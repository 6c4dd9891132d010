//! Filesystem helpers: unpack a pack to a directory, or collect a directory
//! of resources to pack.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::PackResult;
use crate::pack::ResourcePack;

/// Write every resource to `dir/NNN`, named by its zero-padded index.
///
/// Creates `dir` if needed and returns the written paths in table order.
///
/// # Errors
///
/// Returns [`PackError::Io`](crate::PackError::Io) if the directory or a file
/// cannot be written.
pub fn extract(pack: &ResourcePack, dir: &Path) -> PackResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(pack.resource_count());
    for entry in pack.entries() {
        let path = dir.join(format!("{:03}", entry.index()));
        fs::write(&path, entry.data())?;
        debug!(path = ?path, size = entry.size(), "Extracted resource");
        written.push(path);
    }

    info!(dir = ?dir, resources = written.len(), "Unpacked resource pack");
    Ok(written)
}

/// Read every regular file in `dir`, sorted by file name.
///
/// This is the input order [`encode`](crate::encode) expects when building a
/// pack from an unpacked directory: `001`, `002`, ...
///
/// # Errors
///
/// Returns [`PackError::Io`](crate::PackError::Io) if the directory or a file
/// cannot be read.
pub fn load_dir(dir: &Path) -> PackResult<Vec<Vec<u8>>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut resources = Vec::with_capacity(paths.len());
    for path in &paths {
        let data = fs::read(path)?;
        debug!(path = ?path, size = data.len(), "Loaded resource");
        resources.push(data);
    }
    Ok(resources)
}
