//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server and upstream sub-configs. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::media::DEFAULT_CHUNK_SIZE;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration from a file that must exist and parse.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.server.public_url.trim().is_empty() {
            warnings.push("server.public_url is empty; API links will be relative".into());
        }

        if self.upstream.chunk_size == 0 {
            warnings.push("upstream.chunk_size is 0; the default of 1 MiB will be used".into());
        }

        match &self.upstream.backend {
            UpstreamBackend::Http(http) => {
                if http.base_url.is_empty() {
                    warnings.push("upstream.backend.base_url is empty".into());
                }
                if http.channel.is_empty() {
                    warnings.push("upstream.backend.channel is empty".into());
                }
            }
            UpstreamBackend::Local { root } => {
                if !root.is_dir() {
                    warnings.push(format!(
                        "upstream.backend.root {} is not a directory",
                        root.display()
                    ));
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL used to build stream and download links.
    pub public_url: String,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            public_url: "http://localhost:8080".into(),
            db_path: PathBuf::from("/data/filestream.db"),
        }
    }
}

/// Upstream media source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub backend: UpstreamBackend,
    /// Nominal chunk size requested per upstream read.
    pub chunk_size: u64,
    /// Upper bound on the live metadata lookup before falling back to the
    /// stored record.
    pub metadata_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            backend: UpstreamBackend::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            metadata_timeout_secs: 15,
        }
    }
}

impl UpstreamConfig {
    /// Chunk size with the zero value mapped to the default.
    pub fn effective_chunk_size(&self) -> u64 {
        if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}

/// Which upstream implementation serves object bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UpstreamBackend {
    /// Remote message store reached over HTTP.
    Http(HttpUpstreamConfig),
    /// Files on local disk, named `{message_id}_{file_name}`.
    Local { root: PathBuf },
}

impl Default for UpstreamBackend {
    fn default() -> Self {
        UpstreamBackend::Http(HttpUpstreamConfig::default())
    }
}

/// HTTP upstream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpUpstreamConfig {
    pub base_url: String,
    /// Channel (store) holding the media messages.
    pub channel: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// Retries for metadata lookups; chunk reads are never retried.
    pub max_retries: u32,
}

impl Default for HttpUpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".into(),
            channel: String::new(),
            api_token: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}
