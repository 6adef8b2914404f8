use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tempfile::TempDir;

use super::{open_archive, ArchiveError, ArchiveLimits, Locator};
use crate::sniff::detect_content_type;

/// Prefix for scratch directories created under the scratch root.
pub const WORKSPACE_PREFIX: &str = "basket";

/// A fully unpacked archive.
///
/// The directory lives exactly as long as this value: dropping it removes the
/// directory and everything extracted into it.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    archive_modified: Option<SystemTime>,
}

/// Bytes of one entry plus what is needed to frame them in a response.
#[derive(Debug, Clone)]
pub struct ServedEntry {
    /// Full name inside the archive
    pub name: String,
    /// Base name, used for the download hint
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub last_modified: Option<SystemTime>,
}

impl ServedEntry {
    /// `Content-Disposition` value asking the client to save the entry.
    pub fn content_disposition(&self) -> String {
        let plain = !self.filename.is_empty()
            && self
                .filename
                .bytes()
                .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b'\\' | b';' | b','));
        if plain {
            format!("attachment; filename={}", self.filename)
        } else {
            let escaped = self
                .filename
                .chars()
                .filter(|c| !c.is_control())
                .map(|c| match c {
                    '"' | '\\' => format!("\\{}", c),
                    c => c.to_string(),
                })
                .collect::<String>();
            format!("attachment; filename=\"{}\"", escaped)
        }
    }
}

/// Unpack the archive at `archive_path` into a fresh directory under
/// `scratch_root`, keeping each entry's full internal path.
///
/// Entries whose names would land outside the workspace are skipped. Any
/// other failure discards the partially filled workspace.
pub fn extract_to_workspace(
    archive_path: &Path,
    scratch_root: &Path,
    limits: &ArchiveLimits,
) -> Result<Workspace, ArchiveError> {
    let mut archive = open_archive(archive_path, limits)?;
    let archive_modified = fs::metadata(archive_path)?.modified().ok();

    let dir = tempfile::Builder::new()
        .prefix(WORKSPACE_PREFIX)
        .tempdir_in(scratch_root)?;

    let mut budget = limits.max_extracted_bytes;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;

        let Some(relative) = workspace_relative(file.name()) else {
            tracing::warn!(
                archive = %archive_path.display(),
                entry = file.name(),
                "skipping entry that escapes the workspace"
            );
            continue;
        };
        let target = dir.path().join(relative);

        if file.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = fs::File::create(&target)?;
        let copied = io::copy(&mut file.by_ref().take(budget.saturating_add(1)), &mut out)?;
        if copied > budget {
            return Err(ArchiveError::LimitExceeded(format!(
                "archive expands beyond {} bytes",
                limits.max_extracted_bytes
            )));
        }
        budget -= copied;

        if let Some(modified) = archive_modified {
            out.set_modified(modified)?;
        }

        tracing::debug!(
            entry = file.name(),
            path = %target.display(),
            bytes = copied,
            "unzipped entry"
        );
    }

    tracing::debug!(
        archive = %archive_path.display(),
        workspace = %dir.path().display(),
        "extracted archive"
    );

    Ok(Workspace {
        dir,
        archive_modified,
    })
}

/// Fold an archive entry name into a path relative to the workspace.
///
/// Root and `.` components are dropped and `..` climbs back out of a
/// directory. `None` for names that would climb above the workspace, carry a
/// drive prefix or a NUL byte, or name nothing at all.
fn workspace_relative(entry_name: &str) -> Option<PathBuf> {
    if entry_name.contains('\0') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::Prefix(_) => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Modification time of the archive this workspace was unpacked from.
    pub fn archive_modified(&self) -> Option<SystemTime> {
        self.archive_modified
    }

    /// Location of `entry_name` inside the workspace, folded exactly as
    /// extraction placed it. Names that cannot exist in the workspace are
    /// reported as not found.
    pub fn entry_path(&self, entry_name: &str) -> Result<PathBuf, ArchiveError> {
        workspace_relative(entry_name)
            .map(|relative| self.dir.path().join(relative))
            .ok_or_else(|| ArchiveError::NotFound(entry_name.to_string()))
    }

    /// Read the entry named by `locator`.
    pub fn serve_entry(&self, locator: &Locator) -> Result<ServedEntry, ArchiveError> {
        let name = locator.decode()?;
        let path = self.entry_path(&name)?;

        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(ArchiveError::NotFound(name)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArchiveError::NotFound(name))
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = fs::read(&path)?;
        let content_type = detect_content_type(&bytes, Some(&path));
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            entry = %name,
            bytes = bytes.len(),
            content_type = %content_type,
            "serving archive entry"
        );

        Ok(ServedEntry {
            name,
            filename,
            bytes,
            content_type,
            last_modified: metadata.modified().ok(),
        })
    }
}
