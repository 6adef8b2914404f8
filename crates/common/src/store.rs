//! Object store adapter
//!
//! Byte-level create / stat / list / delete against resolved paths. Paths handed to
//! this module have already been sandboxed by [`crate::bucket::BucketResolver`].
//!
//! There is no locking: uploads are renamed into place whole, but two
//! concurrent writers of the same object race and the last rename wins.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(PathBuf),
    #[error("path is a directory: {0}")]
    IsDirectory(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed reading request body: {0}")]
    Body(String),
}

impl StoreError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io(err)
        }
    }
}

/// Metadata read on demand from the filesystem.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

/// One child of a listed directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// Prefix of the temporary files uploads are staged in.
pub const STAGING_PREFIX: &str = ".basket-upload";

#[derive(Debug, Clone, Default)]
pub struct ObjectStore;

impl ObjectStore {
    pub fn new() -> Self {
        Self
    }

    /// Create or overwrite the object at `path` with the contents of `body`.
    /// Returns the number of bytes written.
    ///
    /// The body is staged in a sibling temporary file and renamed over `path`
    /// only once it has been fully written, so a failed upload leaves any
    /// previous object untouched.
    pub async fn create<S, E>(&self, path: &Path, body: S) -> Result<u64, StoreError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).await?;

        if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(StoreError::IsDirectory(path.to_path_buf()));
        }

        let staging_dir = parent.to_path_buf();
        let staged = blocking(move || {
            tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .tempfile_in(staging_dir)
        })
        .await?;

        // dropping `staged` on any error below removes the staging file
        let mut file = fs::File::from_std(staged.reopen()?);
        let written = write_body(&mut file, body).await?;
        drop(file);

        let target = path.to_path_buf();
        blocking(move || staged.persist(target).map_err(|e| e.error)).await?;

        tracing::debug!(path = %path.display(), bytes = written, "stored object");
        Ok(written)
    }

    pub async fn stat(&self, path: &Path) -> Result<ObjectMeta, StoreError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;
        Ok(ObjectMeta {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
            is_dir: metadata.is_dir(),
        })
    }

    /// Remove a single object. Directories are refused.
    pub async fn remove(&self, path: &Path) -> Result<(), StoreError> {
        let meta = self.stat(path).await?;
        if meta.is_dir {
            return Err(StoreError::IsDirectory(path.to_path_buf()));
        }
        fs::remove_file(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;
        tracing::debug!(path = %path.display(), "removed object");
        Ok(())
    }

    /// Children of a directory, sorted by name.
    pub async fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>, StoreError> {
        let mut read_dir = fs::read_dir(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // uploads still in flight
            if name.starts_with(STAGING_PREFIX) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                // raced with a delete
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            entries.push(DirEntry {
                name,
                is_dir: metadata.is_dir(),
                size: metadata.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(io::Error::other)?
}

async fn write_body<S, E>(file: &mut fs::File, body: S) -> Result<u64, StoreError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut written = 0u64;
    let mut body = std::pin::pin!(body);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| StoreError::Body(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}
