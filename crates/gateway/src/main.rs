//! basket - multi-tenant HTTP file storage gateway
//!
//! Each `Host` names a bucket under the storage root. Objects are written
//! with PUT/POST, read with GET and removed with DELETE; stored `.zip`
//! objects can be browsed and unpacked one entry at a time.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use service::http::Config as HttpConfig;
use service::{Config, ServiceState};

mod process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(short, long, env = "BASKET_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on for HTTP requests
    #[arg(short, long, env = "BASKET_LISTEN")]
    listen: Option<SocketAddr>,

    /// Directory holding one subdirectory per bucket
    #[arg(long, env = "BASKET_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Directory for temporary archive workspaces
    #[arg(long, env = "BASKET_SCRATCH_ROOT")]
    scratch_root: Option<PathBuf>,

    /// Host the gateway answers to, stripped to find the bucket (repeatable)
    #[arg(long = "self-host", env = "BASKET_SELF_HOSTS", value_delimiter = ',')]
    self_hosts: Vec<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "BASKET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Shorthand for `--log-level debug`
    #[arg(long, env = "DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
    debug: bool,

    /// Also write daily rolling log files into this directory
    #[arg(long, env = "BASKET_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    /// Layer the command line over the config file (or the defaults).
    fn into_config(self) -> Result<(Config, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(storage_root) = self.storage_root {
            config.storage_root = storage_root;
        }
        if let Some(scratch_root) = self.scratch_root {
            config.scratch_root = scratch_root;
        }
        if !self.self_hosts.is_empty() {
            config.self_hosts = self.self_hosts;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if self.debug {
            config.log_level = "debug".to_string();
        }

        // surface a bad level before logging is up
        config.log_level()?;
        Ok((config, self.log_dir))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, log_dir) = Args::parse().into_config()?;

    let _guards = process::init_logging(config.log_level()?, log_dir.as_deref());
    process::register_panic_logger();
    process::report_build_info();

    for root in [&config.storage_root, &config.scratch_root] {
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create directory {}", root.display()))?;
    }

    let state = ServiceState::from_config(&config)?;
    let mut http_config = HttpConfig::from(&config);
    http_config.log_level = config.log_level()?;

    let (graceful_waiter, shutdown_rx) = process::graceful_shutdown_blocker()?;

    service::http::run(http_config, state, shutdown_rx).await?;
    let _ = graceful_waiter.await;

    tracing::info!("gateway shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("basket").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let (config, log_dir) = args(&[
            "--listen",
            "127.0.0.1:9100",
            "--storage-root",
            "/srv/basket",
            "--self-host",
            "files.example.com",
            "--self-host",
            "localhost:9100",
            "--log-dir",
            "/var/log/basket",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.storage_root, PathBuf::from("/srv/basket"));
        assert_eq!(config.self_hosts, vec!["files.example.com", "localhost:9100"]);
        assert_eq!(log_dir, Some(PathBuf::from("/var/log/basket")));
    }

    #[test]
    fn test_debug_flag_wins() {
        let (config, _) = args(&["--log-level", "warn", "--debug"])
            .into_config()
            .unwrap();
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_config_file_then_flags() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("basket.toml");
        std::fs::write(
            &path,
            "storage_root = \"/from/file\"\nscratch_root = \"/scratch/file\"\n",
        )
        .unwrap();

        let (config, _) = args(&[
            "--config",
            path.to_str().unwrap(),
            "--scratch-root",
            "/scratch/flag",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/from/file"));
        assert_eq!(config.scratch_root, PathBuf::from("/scratch/flag"));
    }

    #[test]
    fn test_bad_log_level_is_rejected() {
        assert!(args(&["--log-level", "loud"]).into_config().is_err());
    }
}
