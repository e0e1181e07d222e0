//! # paydrop
//!
//! A paid file download gateway.
//!
//! A buyer asks for an asset, pays through the processor's checkout, and
//! gets back a short-lived token that downloads the protected file exactly
//! once.
//!
//! ## Flow
//!
//! - `POST /order` creates a processor order for a catalog asset
//! - `POST /verify` checks the checkout signature, confirms the payment is
//!   captured with the processor, and mints a download token
//! - `GET /download?token=` consumes the token and streams the file
//!
//! Orders and tokens live in an embedded `sled` database so a restart does
//! not lose paid downloads.
//!
//! ## Example
//!
//! ```rust,no_run
//! use paydrop::{GatewayBuilder, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::from_file("paydrop.toml".as_ref())?;
//!     let server = GatewayBuilder::new(config).build().await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod http;
pub mod ledger;
pub mod order;
pub mod payment;
pub mod processor;
pub mod redeem;
pub mod server;
pub mod store;
pub mod token;
pub mod vault;

pub use catalog::Catalog;
pub use config::{CatalogEntry, GatewayConfig, LogFormat, ProcessorConfig};
pub use error::{Error, ErrorKind, Result};
pub use event::{GatewayEvent, GatewayEventsChannel};
pub use gateway::Gateway;
pub use processor::signature::{compute_signature, verify_signature};
pub use processor::{PaymentInfo, PaymentProcessor, PaymentState, RazorpayClient};
pub use server::{GatewayBuilder, RunningGateway, ShutdownHandle};
pub use store::{GatewayStore, MemoryStore, SledStore};
pub use token::DownloadToken;
