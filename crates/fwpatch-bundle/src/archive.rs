//! Bundle archive reading and atomic writing

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{BundleError, BundleResult};

/// Read access to an existing bundle.
pub struct BundleReader {
    archive: ZipArchive<File>,
}

impl BundleReader {
    /// Open the bundle at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is not a zip archive.
    pub fn open(path: &Path) -> BundleResult<Self> {
        debug!(path = ?path, "Opening bundle");
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        Ok(Self { archive })
    }

    /// Entry names in archive order.
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Whether the archive has an entry called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Read the entry `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::MissingEntry`] if there is no such entry.
    pub fn read(&mut self, name: &str) -> BundleResult<Vec<u8>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Err(BundleError::MissingEntry(name.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Copy every entry not named in `skip` into `writer`, in archive order.
    /// Returns the names copied.
    ///
    /// # Errors
    ///
    /// Propagates read and write failures.
    pub fn copy_except(
        &mut self,
        writer: &mut BundleWriter,
        skip: &[&str],
    ) -> BundleResult<Vec<String>> {
        let mut copied = Vec::new();
        for position in 0..self.archive.len() {
            let mut entry = self.archive.by_index(position)?;
            let name = entry.name().to_string();
            if skip.contains(&name.as_str()) {
                debug!(entry = %name, "Skipping replaced entry");
                continue;
            }
            if entry.is_dir() {
                writer.add_directory(&name)?;
            } else {
                let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
                entry.read_to_end(&mut data)?;
                writer.add(&name, &data)?;
            }
            info!(entry = %name, "Copied");
            copied.push(name);
        }
        Ok(copied)
    }
}

/// Temporary file in `dir` for a bundle being written.
///
/// On Unix the file is opened with mode `0o666` rather than tempfile's
/// `0o600`, so after the umask the finished bundle has the same mode as any
/// other file the process creates.
fn staging_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".fwpatch-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Writes a bundle to a temporary file next to its destination and renames it
/// into place on [`BundleWriter::finish`].
///
/// Dropping the writer without finishing removes the temporary file, so a
/// failed run never leaves a partial bundle behind.
pub struct BundleWriter {
    zip: ZipWriter<NamedTempFile>,
    destination: PathBuf,
    options: SimpleFileOptions,
}

impl BundleWriter {
    /// Stage a new bundle for `destination`.
    ///
    /// # Errors
    ///
    /// Fails if the temporary file cannot be created in the destination
    /// directory.
    pub fn create(destination: &Path) -> BundleResult<Self> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = staging_file(dir)?;
        debug!(staging = ?staging.path(), destination = ?destination, "Staging bundle");
        Ok(Self {
            zip: ZipWriter::new(staging),
            destination: destination.to_path_buf(),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        })
    }

    /// Add a file entry.
    ///
    /// # Errors
    ///
    /// Propagates archive and I/O failures.
    pub fn add(&mut self, name: &str, data: &[u8]) -> BundleResult<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(data)?;
        debug!(entry = %name, size = data.len(), "Wrote entry");
        Ok(())
    }

    /// Add a directory entry.
    ///
    /// # Errors
    ///
    /// Propagates archive failures.
    pub fn add_directory(&mut self, name: &str) -> BundleResult<()> {
        self.zip.add_directory(name, self.options)?;
        Ok(())
    }

    /// Finish the archive and move it to its destination.
    ///
    /// # Errors
    ///
    /// Fails if the central directory cannot be written or the rename fails.
    pub fn finish(self) -> BundleResult<PathBuf> {
        let staging = self.zip.finish()?;
        staging
            .persist(&self.destination)
            .map_err(|e| BundleError::Io(e.error))?;
        info!(path = ?self.destination, "Bundle written");
        Ok(self.destination)
    }
}
