//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use paydrop::config::{GatewayConfig, LogFormat};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Paid file download gateway.
#[derive(Parser, Debug)]
#[command(name = "paydrop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, short, env = "PAYDROP_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Port to listen on, keeping the configured host. Set by most PaaS hosts.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory for the order and token store.
    #[arg(long, env = "PAYDROP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the files that are sold.
    #[arg(long, env = "PAYDROP_PROTECTED_DIR")]
    pub protected_dir: Option<PathBuf>,

    /// Public base URL of this gateway.
    #[arg(long, env = "PAYDROP_BASE_URL")]
    pub base_url: Option<String>,

    /// Download token lifetime in seconds.
    #[arg(long, env = "PAYDROP_DOWNLOAD_TTL")]
    pub download_ttl: Option<u64>,

    /// Processor public key id.
    #[arg(long, env = "PAYDROP_KEY_ID")]
    pub key_id: Option<String>,

    /// Processor key secret.
    #[arg(long, env = "PAYDROP_KEY_SECRET", hide_env_values = true)]
    pub key_secret: Option<String>,

    /// Log level.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    pub log_format: Option<CliLogFormat>,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration (secret masked) and exit.
    #[arg(long)]
    pub print_config: bool,
}

/// Log format CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliLogFormat {
    /// Human readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl Cli {
    /// Convert CLI arguments into a `GatewayConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<GatewayConfig> {
        let mut config = if let Some(ref path) = self.config {
            GatewayConfig::from_file(path)?
        } else {
            GatewayConfig::default()
        };

        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(port) = self.port {
            config.listen.set_port(port);
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(protected_dir) = self.protected_dir {
            config.protected_dir = protected_dir;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(ttl) = self.download_ttl {
            config.download_ttl_secs = ttl;
        }
        if let Some(key_id) = self.key_id {
            config.processor.key_id = key_id;
        }
        if let Some(key_secret) = self.key_secret {
            config.processor.key_secret = key_secret;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format.into();
        }

        Ok(config)
    }
}

impl From<CliLogFormat> for LogFormat {
    fn from(f: CliLogFormat) -> Self {
        match f {
            CliLogFormat::Text => Self::Text,
            CliLogFormat::Json => Self::Json,
        }
    }
}
