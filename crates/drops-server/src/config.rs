use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Receiver settings, read from `DROPS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    /// Multipart field expected to carry the file.
    pub field: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3210,
            storage_dir: "./drops-storage".into(),
            field: "file".into(),
            max_body_bytes: 1024 * 1024 * 1024, // 1 GB
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("DROPS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DROPS_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("DROPS_PORT is not a port number: {}", port))?;
        }
        if let Some(dir) = lookup("DROPS_STORAGE_DIR") {
            config.storage_dir = dir.into();
        }
        if let Some(field) = lookup("DROPS_FIELD") {
            config.field = field;
        }
        if let Some(mb) = lookup("DROPS_MAX_BODY_MB") {
            let mb: usize = mb
                .parse()
                .with_context(|| format!("DROPS_MAX_BODY_MB is not a number: {}", mb))?;
            config.max_body_bytes = mb * 1024 * 1024;
        }

        Ok(config)
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
