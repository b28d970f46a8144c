//! Configuration for the file service.
//!
//! Loaded from a TOML file, every section and key optional:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! max_upload_bytes = 104857600
//!
//! [storage]
//! root = "test_files"
//! read_chunk_size = 8192
//!
//! [logging]
//! level = "info"
//! file = "logs/file-service.log"
//! ```

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes. `0` disables the limit.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Local file storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per user id.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Size of the chunks file content is streamed back in.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("test_files")
}

fn default_read_chunk_size() -> usize {
    8192
}

impl StorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_chunk_size: default_read_chunk_size(),
        }
    }

    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(default_storage_root())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, written in addition to stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, falling back to the defaults when
    /// the file does not exist, then apply environment variable overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILE_SERVICE_HOST`
    /// - `FILE_SERVICE_PORT`
    /// - `FILE_SERVICE_STORAGE_ROOT`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("FILE_SERVICE_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }

        if let Ok(port) = std::env::var("FILE_SERVICE_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid FILE_SERVICE_PORT: {}", port),
            }
        }

        if let Ok(root) = std::env::var("FILE_SERVICE_STORAGE_ROOT") {
            if !root.is_empty() {
                self.storage.root = PathBuf::from(root);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.read_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "storage.read_chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.root must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Address the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
