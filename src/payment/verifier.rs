//! Payment verifier: authenticate a completed payment and mint its token.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use crate::processor::signature::verify_signature;
use crate::processor::PaymentProcessor;
use crate::store::{GatewayStore, OrderClaim};
use crate::token::{self, DownloadToken};
use crate::vault::FileVault;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Attempts at drawing an unused token string before giving up.
const MINT_ATTEMPTS: usize = 3;

/// Configuration for the payment verifier.
#[derive(Clone)]
pub struct PaymentVerifierConfig {
    /// Processor key secret shared for callback signatures.
    pub key_secret: String,
    /// Lifetime of minted tokens.
    pub download_ttl: Duration,
    /// Hand back the live token on repeat verification instead of minting.
    pub single_token_per_order: bool,
}

impl std::fmt::Debug for PaymentVerifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentVerifierConfig")
            .field("key_secret", &"<redacted>")
            .field("download_ttl", &self.download_ttl)
            .field("single_token_per_order", &self.single_token_per_order)
            .finish()
    }
}

/// A token handed to the client after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Token string.
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
    /// True when an earlier token for the same order was returned.
    pub reissued: bool,
}

/// Verifies payments and mints download tokens.
pub struct PaymentVerifier {
    config: PaymentVerifierConfig,
    catalog: Arc<Catalog>,
    store: Arc<dyn GatewayStore>,
    processor: Arc<dyn PaymentProcessor>,
    vault: FileVault,
    events: GatewayEventsSender,
}

impl PaymentVerifier {
    /// Create a new payment verifier.
    #[must_use]
    pub fn new(
        config: PaymentVerifierConfig,
        catalog: Arc<Catalog>,
        store: Arc<dyn GatewayStore>,
        processor: Arc<dyn PaymentProcessor>,
        vault: FileVault,
        events: GatewayEventsSender,
    ) -> Self {
        info!(
            "Payment verifier initialized (ttl={}s, single_token_per_order={})",
            config.download_ttl.as_secs(),
            config.single_token_per_order
        );
        Self {
            config,
            catalog,
            store,
            processor,
            vault,
            events,
        }
    }

    /// Verify a completed payment and issue a download token.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if a field is empty or the payment is not captured
    /// - `Forbidden` if the signature does not match, the payment belongs to
    ///   another order, or the order's single token was already spent
    /// - `NotFound` if the order, its asset or the backing file is missing
    /// - `Upstream` if the processor cannot be queried
    /// - `Storage` if the token cannot be persisted
    pub async fn verify_payment(
        &self,
        payment_id: &str,
        order_id: &str,
        signature: &str,
    ) -> Result<IssuedToken> {
        if payment_id.is_empty() || order_id.is_empty() || signature.is_empty() {
            return Err(Error::InvalidRequest("missing params".to_string()));
        }

        verify_signature(
            self.config.key_secret.as_bytes(),
            order_id,
            payment_id,
            signature,
        )
        .map_err(|e| {
            debug!(
                "Rejected callback for order {}: signature mismatch",
                token::log_id(order_id)
            );
            e
        })?;

        let payment = self.processor.fetch_payment(payment_id).await?;
        if !payment.is_captured() {
            debug!(
                "Payment {payment_id} for order {order_id} is {}, not captured",
                payment.status
            );
            return Err(Error::InvalidRequest("payment not captured".to_string()));
        }
        if let Some(paid_order) = payment.order_id.as_deref() {
            if paid_order != order_id {
                warn!("Payment {payment_id} belongs to {paid_order}, not {order_id}");
                return Err(Error::Forbidden(
                    "payment does not match order".to_string(),
                ));
            }
        }

        let order = self
            .store
            .get_order(order_id)?
            .ok_or_else(|| Error::NotFound("order not found".to_string()))?;

        let filename = self
            .catalog
            .lookup(&order.asset_id)
            .ok_or_else(|| Error::NotFound("file not found".to_string()))?;
        let file_path = self.vault.resolve(filename)?;
        if !self.vault.exists(&file_path).await {
            warn!(
                "Order {order_id} paid but {} is missing",
                file_path.display()
            );
            return Err(Error::NotFound("file missing".to_string()));
        }

        let now = Utc::now();
        let minted = self.mint(file_path, now)?;

        if self.config.single_token_per_order {
            match self.store.claim_order_token(order_id, &minted.token) {
                Ok(OrderClaim::Claimed) => {}
                Ok(OrderClaim::Existing(existing)) => {
                    return self.reissue(order_id, &minted, &existing, now);
                }
                Err(e) => {
                    self.discard(&minted);
                    return Err(e);
                }
            }
        }

        info!(
            "Payment {payment_id} verified for order {order_id}; token {} issued",
            token::log_id(&minted.token)
        );
        let _ = self.events.send(GatewayEvent::TokenMinted {
            order_id: order_id.to_string(),
        });

        Ok(IssuedToken {
            token: minted.token,
            expires_in: self.config.download_ttl.as_secs(),
            reissued: false,
        })
    }

    /// Persist a fresh token for `file_path`.
    fn mint(&self, file_path: PathBuf, now: DateTime<Utc>) -> Result<DownloadToken> {
        for _ in 0..MINT_ATTEMPTS {
            let record = DownloadToken::mint(file_path.clone(), self.config.download_ttl, now);
            if self.store.insert_token(&record)? {
                return Ok(record);
            }
            warn!(
                "Token collision on {}; drawing again",
                token::log_id(&record.token)
            );
        }
        Err(Error::Storage("could not allocate a unique token".to_string()))
    }

    /// Remove a minted token nobody will be handed.
    fn discard(&self, minted: &DownloadToken) {
        if let Err(e) = self.store.take_token(&minted.token) {
            error!(
                "Failed to remove unissued token {}: {e}",
                token::log_id(&minted.token)
            );
        }
    }

    /// The order already holds a token: drop the one just minted and hand
    /// back the existing one while it is still live.
    fn reissue(
        &self,
        order_id: &str,
        minted: &DownloadToken,
        existing: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        self.discard(minted);

        match self.store.get_token(existing)? {
            Some(live) if !live.is_expired(now) => {
                info!(
                    "Order {order_id} verified again; returning token {}",
                    token::log_id(&live.token)
                );
                Ok(IssuedToken {
                    expires_in: live.remaining_secs(now),
                    token: live.token,
                    reissued: true,
                })
            }
            Some(_) => {
                debug!("Order {order_id} verified again after its token expired");
                Err(Error::Forbidden("order token expired".to_string()))
            }
            None => {
                debug!("Order {order_id} verified again after its token was redeemed");
                Err(Error::Forbidden("order already redeemed".to_string()))
            }
        }
    }
}
