use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use common::archive::ArchiveLimits;
use common::bucket::{SelfHosts, DEFAULT_SELF_HOSTS};

/// Maximum upload size in bytes (500 MB)
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;

/// Gateway configuration.
///
/// Built once at startup, from an optional TOML file with command line
/// overrides applied on top, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Directory holding one subdirectory per bucket
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// Directory under which archive workspaces are created
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
    /// `host:port` strings naming the gateway itself, stripped from the
    ///  `Host` header to recover the bucket
    #[serde(default = "default_self_hosts")]
    pub self_hosts: Vec<String>,
    #[serde(default)]
    pub archive_limits: ArchiveLimits,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// One of error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 9002)
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("/data")
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_self_hosts() -> Vec<String> {
    DEFAULT_SELF_HOSTS.iter().map(|h| h.to_string()).collect()
}

fn default_max_upload_bytes() -> usize {
    MAX_UPLOAD_SIZE_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            storage_root: default_storage_root(),
            scratch_root: default_scratch_root(),
            self_hosts: default_self_hosts(),
            archive_limits: ArchiveLimits::default(),
            max_upload_bytes: default_max_upload_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Read a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn self_hosts(&self) -> SelfHosts {
        SelfHosts::new(self.self_hosts.iter().cloned())
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}
