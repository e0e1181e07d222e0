//! paydrop server entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use paydrop::{GatewayBuilder, LogFormat};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let print_config = cli.print_config;
    let config = cli.into_config()?;

    if print_config {
        print!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    info!("paydrop v{}", env!("CARGO_PKG_VERSION"));

    let server = GatewayBuilder::new(config).build().await?;
    server.run().await?;

    info!("Goodbye!");
    Ok(())
}
