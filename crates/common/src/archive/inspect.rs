use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{open_archive, ArchiveError, ArchiveLimits, Locator};

/// One member of a ZIP archive, as shown when browsing.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    /// Full name inside the archive, `/` separated
    pub name: String,
    /// Base name of the entry
    pub filename: String,
    /// Directory the entry appears under, relative to the archive's location
    pub directory: PathBuf,
    pub locator: Locator,
    pub is_dir: bool,
    /// Uncompressed size in bytes
    pub size: u64,
    pub compressed_size: u64,
}

impl ArchiveEntry {
    fn new(archive_dir: &Path, name: &str, is_dir: bool, size: u64, compressed_size: u64) -> Self {
        let trimmed = name.trim_end_matches('/');
        let (parent, filename) = match trimmed.rsplit_once('/') {
            Some((parent, base)) => (parent, base),
            None => ("", trimmed),
        };
        let directory = if parent.is_empty() {
            archive_dir.to_path_buf()
        } else {
            archive_dir.join(parent)
        };

        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            directory,
            locator: Locator::encode(name),
            is_dir,
            size,
            compressed_size,
        }
    }
}

/// Read the central directory of the archive at `archive_path`.
///
/// Entries come back in the archive's own order. Directory entries are
/// included and flagged with `is_dir`.
pub fn list_entries(
    archive_path: &Path,
    limits: &ArchiveLimits,
) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = open_archive(archive_path, limits)?;
    let archive_dir = archive_path.parent().unwrap_or_else(|| Path::new(""));

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        // raw access reads the header only, no decompressor is set up
        let file = archive.by_index_raw(index)?;
        entries.push(ArchiveEntry::new(
            archive_dir,
            file.name(),
            file.is_dir(),
            file.size(),
            file.compressed_size(),
        ));
    }

    tracing::debug!(
        archive = %archive_path.display(),
        entries = entries.len(),
        "listed archive entries"
    );
    Ok(entries)
}
