use std::fmt::Debug;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::ServiceState;

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("{role} root {} is missing or not a directory", .path.display())]
    MissingRoot { role: &'static str, path: PathBuf },
    #[error("{role} root {} is read-only", .path.display())]
    ReadOnlyRoot { role: &'static str, path: PathBuf },
}

impl DataSourceError {
    /// Which root failed: `storage` or `scratch`
    pub fn role(&self) -> &'static str {
        match self {
            DataSourceError::MissingRoot { role, .. }
            | DataSourceError::ReadOnlyRoot { role, .. } => role,
        }
    }
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready while the storage and scratch roots are writable directories.
struct DirectorySource {
    roots: Vec<(&'static str, PathBuf)>,
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        for (role, path) in &self.roots {
            let role = *role;
            let meta = match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => meta,
                _ => {
                    return Err(DataSourceError::MissingRoot {
                        role,
                        path: path.clone(),
                    })
                }
            };
            if meta.permissions().readonly() {
                return Err(DataSourceError::ReadOnlyRoot {
                    role,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(Arc::new(DirectorySource {
            roots: vec![
                ("storage", state.storage_root().to_path_buf()),
                ("scratch", state.scratch_root().to_path_buf()),
            ],
        })))
    }
}
