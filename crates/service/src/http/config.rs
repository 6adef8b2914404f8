use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // Largest request body accepted on upload
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, max_upload_bytes: usize) -> Self {
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, max_upload_bytes={}",
            listen_addr,
            max_upload_bytes
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            max_upload_bytes,
        }
    }
}

impl From<&crate::config::Config> for Config {
    fn from(config: &crate::config::Config) -> Self {
        Self::new(config.listen_addr, config.max_upload_bytes)
    }
}
