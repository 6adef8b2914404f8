use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::bucket::BucketResolver;
use common::store::ObjectStore;

use super::config::Config;

/// Main service state - shared, read-only, cheap to clone
#[derive(Clone)]
pub struct State {
    config: Arc<Config>,
    resolver: BucketResolver,
    store: ObjectStore,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // Bootstrap is expected to have created both roots
        for root in [&config.storage_root, &config.scratch_root] {
            if !root.is_dir() {
                return Err(StateSetupError::MissingDirectory(root.clone()));
            }
        }

        let resolver = BucketResolver::new(config.storage_root.clone(), config.self_hosts());
        tracing::info!(
            storage_root = %config.storage_root.display(),
            scratch_root = %config.scratch_root.display(),
            self_hosts = ?config.self_hosts,
            "service state ready"
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            resolver,
            store: ObjectStore::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &BucketResolver {
        &self.resolver
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn storage_root(&self) -> &Path {
        self.resolver.storage_root()
    }

    pub fn scratch_root(&self) -> &Path {
        &self.config.scratch_root
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("required directory does not exist: {0}")]
    MissingDirectory(PathBuf),
}
