//! # Configuration
//!
//! TOML configuration for the web server. Every section and field has a
//! default, so a partial file (or no file at all) is valid.
//!
//! ```toml
//! [server]
//! address = "0.0.0.0:5000"
//! static_dir = "static"
//!
//! [storage]
//! upload_dir = "/tmp/stegano"
//! max_content_length = 1073741824
//! buffer_size = 65536
//!
//! [workers]
//! pool_size = 4
//!
//! [logging]
//! level = "info"
//! file = "stegano.log"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: AppConfig = load_config("config/server.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub storage: StorageConfig,
    pub workers: WorkerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn from_optional_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }
}

/// Where the HTTP server listens and what it serves besides the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Listen address (e.g., "0.0.0.0:5000")
    pub address: String,
    /// Directory of static frontend files served at `/`
    pub static_dir: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:5000".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Scratch storage for uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Upload directory. `None` means a fresh temporary directory, removed on exit.
    pub upload_dir: Option<PathBuf>,
    /// Largest accepted request body in bytes
    pub max_content_length: usize,
    /// Write buffer used while saving uploads
    pub buffer_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: None,
            max_content_length: 1024 * 1024 * 1024,
            buffer_size: 64 * 1024,
        }
    }
}

/// Bounded pool for CPU-heavy codec work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum number of encode/decode/capacity operations running at once
    pub pool_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { pool_size: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter ("error", "warn", "info", "debug", "trace")
    pub level: String,
    /// Optional file that receives a copy of every log line
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
