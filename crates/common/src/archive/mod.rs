//! Browsable ZIP archives
//!
//! A stored `.zip` object can be presented as a small read-only filesystem:
//! [`list_entries`] walks its central directory, [`extract_to_workspace`]
//! unpacks it into a scratch [`Workspace`] scoped to one request, and
//! [`Workspace::serve_entry`] hands back a single entry addressed by its
//! [`Locator`].
//!
//! Everything in here is blocking I/O. Callers on an async runtime should
//! move the work onto a blocking thread.

use std::io;

mod extract;
mod inspect;
mod locator;

pub use extract::{extract_to_workspace, ServedEntry, Workspace, WORKSPACE_PREFIX};
pub use inspect::{list_entries, ArchiveEntry};
pub use locator::Locator;

/// Bounds on how much work one archive may cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ArchiveLimits {
    /// Largest archive object that will be opened, in bytes
    pub max_archive_bytes: u64,
    /// Most entries an archive may declare
    pub max_entries: usize,
    /// Total uncompressed bytes extraction may write
    pub max_extracted_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 1024 * 1024 * 1024,
            max_entries: 65_536,
            max_extracted_bytes: 4 * 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("error reading zip archive: {0}")]
    Read(#[from] zip::result::ZipError),
    #[error("entry not found in archive: {0}")]
    NotFound(String),
    #[error("invalid entry locator: {0}")]
    InvalidLocator(String),
    #[error("archive exceeds limit: {0}")]
    LimitExceeded(String),
}

/// Open `path` as a ZIP container, enforcing the size and entry-count limits.
fn open_archive(
    path: &std::path::Path,
    limits: &ArchiveLimits,
) -> Result<zip::ZipArchive<std::fs::File>, ArchiveError> {
    let file = std::fs::File::open(path)?;
    let size = file.metadata()?.len();
    if size > limits.max_archive_bytes {
        return Err(ArchiveError::LimitExceeded(format!(
            "archive is {} bytes, limit is {}",
            size, limits.max_archive_bytes
        )));
    }

    let archive = zip::ZipArchive::new(file)?;
    if archive.len() > limits.max_entries {
        return Err(ArchiveError::LimitExceeded(format!(
            "archive has {} entries, limit is {}",
            archive.len(),
            limits.max_entries
        )));
    }

    tracing::debug!(path = %path.display(), size, entries = archive.len(), "opened archive");
    Ok(archive)
}
