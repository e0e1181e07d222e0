//! Redemption: exchange a token for its file, exactly once.
//!
//! The token row is removed before anything is served. Removal is the
//! atomic gate: of several concurrent redemptions of one token only the
//! caller whose delete actually removed the row proceeds; every other caller
//! sees no row and is refused. A consumed token is not refunded if serving
//! then fails.
//!
//! ```text
//! Minted ──take (fresh)───▶ Consumed
//!   │
//!   └──────take (late)────▶ Expired
//! ```
//!
//! Both terminal states look the same afterwards: the row is gone.

use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use crate::store::GatewayStore;
use crate::token::log_id;
use crate::vault::{FileVault, VaultFile};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A consumed token's file, ready to stream.
#[derive(Debug)]
pub struct Redemption {
    /// Name to present the file under.
    pub filename: String,
    /// Opened file.
    pub file: VaultFile,
}

/// Consumes tokens and opens their files.
pub struct RedemptionHandler {
    store: Arc<dyn GatewayStore>,
    vault: FileVault,
    events: GatewayEventsSender,
}

impl RedemptionHandler {
    /// Create a redemption handler.
    #[must_use]
    pub fn new(
        store: Arc<dyn GatewayStore>,
        vault: FileVault,
        events: GatewayEventsSender,
    ) -> Self {
        Self {
            store,
            vault,
            events,
        }
    }

    /// Redeem `token`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `token` is empty
    /// - `Forbidden` if the token is unknown, already used, or expired
    /// - `NotFound` if the file behind a valid token is gone
    /// - `Storage`/`Io` on backend failure
    pub async fn redeem(&self, token: &str) -> Result<Redemption> {
        if token.is_empty() {
            return Err(Error::InvalidRequest("token required".to_string()));
        }

        let Some(record) = self.store.take_token(token)? else {
            debug!("Refused token {}", log_id(token));
            return Err(Error::Forbidden("invalid or used token".to_string()));
        };

        if record.is_expired(Utc::now()) {
            info!("Reaped expired token {}", log_id(token));
            let _ = self.events.send(GatewayEvent::TokenExpired);
            return Err(Error::Forbidden("token expired".to_string()));
        }

        let Some(file) = self.vault.open(&record.file_path).await? else {
            warn!(
                "Token {} consumed but {} is missing",
                log_id(token),
                record.file_path.display()
            );
            return Err(Error::NotFound("file not found".to_string()));
        };

        let filename = record.filename();
        info!(
            "Token {} redeemed for {filename} ({} bytes)",
            log_id(token),
            file.len
        );
        let _ = self.events.send(GatewayEvent::TokenRedeemed {
            filename: filename.clone(),
        });

        Ok(Redemption { filename, file })
    }
}
