//! Configuration for paydrop.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Directory holding the persistent store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding the files that are sold.
    #[serde(default = "default_protected_dir")]
    pub protected_dir: PathBuf,

    /// Public base URL of the deployed gateway.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Lifetime of a download token in seconds.
    #[serde(default = "default_download_ttl")]
    pub download_ttl_secs: u64,

    /// Amount (minor currency units) used when an order omits it.
    #[serde(default = "default_amount")]
    pub default_amount: u64,

    /// ISO currency code for new orders.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Return the live token on repeat verification instead of minting another.
    #[serde(default = "default_true")]
    pub single_token_per_order: bool,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Payment processor configuration.
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Purchasable assets.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,
}

/// Payment processor credentials and limits.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Public key id, handed to clients for checkout.
    #[serde(default)]
    pub key_id: String,

    /// Shared secret used for API auth and signature verification.
    #[serde(default)]
    pub key_secret: String,

    /// Processor REST API base.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bound on every processor call, in seconds.
    #[serde(default = "default_processor_timeout")]
    pub timeout_secs: u64,
}

/// A single catalog entry: asset id to file name under `protected_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Asset identifier clients purchase by.
    pub id: String,
    /// File name inside the protected directory.
    pub filename: String,
}

impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            data_dir: default_data_dir(),
            protected_dir: default_protected_dir(),
            base_url: default_base_url(),
            download_ttl_secs: default_download_ttl(),
            default_amount: default_amount(),
            currency: default_currency(),
            single_token_per_order: true,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            processor: ProcessorConfig::default(),
            catalog: default_catalog(),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            api_base: default_api_base(),
            timeout_secs: default_processor_timeout(),
        }
    }
}

impl CatalogEntry {
    /// Create a catalog entry.
    #[must_use]
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 10000))
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "paydrop")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".paydrop"))
}

fn default_protected_dir() -> PathBuf {
    PathBuf::from("protected_files")
}

fn default_base_url() -> String {
    "http://localhost:10000".to_string()
}

const fn default_download_ttl() -> u64 {
    300 // 5 minutes
}

const fn default_amount() -> u64 {
    100
}

fn default_currency() -> String {
    "INR".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://api.razorpay.com/v1".to_string()
}

const fn default_processor_timeout() -> u64 {
    30
}

fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("banner1", "banner1-clean.png"),
        CatalogEntry::new("banner2", "banner2-clean.jpg"),
    ]
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render the configuration as TOML with the processor secret masked.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.processor.key_secret.is_empty() {
            shown.processor.key_secret = "<redacted>".to_string();
        }
        toml::to_string_pretty(&shown).map_err(|e| Error::Config(e.to_string()))
    }

    /// Path of the embedded database.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Download token lifetime.
    #[must_use]
    pub fn download_ttl(&self) -> Duration {
        Duration::from_secs(self.download_ttl_secs)
    }

    /// Check the configuration for values the gateway cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.processor.key_id.is_empty() {
            return Err(Error::Config("processor.key_id is required".to_string()));
        }
        if self.processor.key_secret.is_empty() {
            return Err(Error::Config(
                "processor.key_secret is required".to_string(),
            ));
        }
        if self.processor.timeout_secs == 0 {
            return Err(Error::Config(
                "processor.timeout_secs must be positive".to_string(),
            ));
        }
        if self.download_ttl_secs == 0 {
            return Err(Error::Config(
                "download_ttl_secs must be positive".to_string(),
            ));
        }
        if self.default_amount == 0 {
            return Err(Error::Config("default_amount must be positive".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.catalog {
            if !seen.insert(entry.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate catalog id: {}",
                    entry.id
                )));
            }
            if !is_plain_file_name(&entry.filename) {
                return Err(Error::Config(format!(
                    "catalog entry {} must name a file directly inside protected_dir, got {}",
                    entry.id, entry.filename
                )));
            }
        }
        Ok(())
    }
}

/// True when `name` is a single normal path component.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    )
}
