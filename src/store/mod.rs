//! Shared persistent state: the order ledger and the token store.
//!
//! Every operation touches exactly one row and is atomic on its own, so no
//! logical operation needs a multi-row transaction. The one ordering rule
//! that matters is token consumption: [`GatewayStore::take_token`] removes
//! and returns the record in a single step, so among concurrent callers
//! exactly one observes `Some`.
//!
//! ```text
//!  orders        order_id -> Order          (append only)
//!  tokens        token    -> DownloadToken  (insert once, removed on redeem/expiry)
//!  order_tokens  order_id -> token          (first claim wins)
//! ```

mod disk;
mod memory;

pub use disk::SledStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::ledger::Order;
use crate::token::DownloadToken;

/// Outcome of claiming the token slot of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderClaim {
    /// The slot was empty and now holds the proposed token.
    Claimed,
    /// Another token already holds the slot.
    Existing(String),
}

/// Row counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Recorded orders.
    pub orders: usize,
    /// Outstanding tokens (including expired ones not yet reaped).
    pub tokens: usize,
}

/// Atomic single-row operations over orders and tokens.
pub trait GatewayStore: Send + Sync {
    /// Append an order. Fails if the order id is already recorded.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` on a duplicate id or backend failure.
    fn insert_order(&self, order: &Order) -> Result<()>;

    /// Fetch an order by processor id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record is corrupt.
    fn get_order(&self, order_id: &str) -> Result<Option<Order>>;

    /// Insert a token if no record with the same token string exists.
    ///
    /// Returns `false` when the token string is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn insert_token(&self, token: &DownloadToken) -> Result<bool>;

    /// Fetch a token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record is corrupt.
    fn get_token(&self, token: &str) -> Result<Option<DownloadToken>>;

    /// Atomically delete a token, returning the record if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record is corrupt.
    fn take_token(&self, token: &str) -> Result<Option<DownloadToken>>;

    /// Bind `token` to `order_id` unless the order already has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn claim_order_token(&self, order_id: &str, token: &str) -> Result<OrderClaim>;

    /// Current row counts.
    fn stats(&self) -> StoreStats;

    /// Make all completed writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot flush.
    fn flush(&self) -> Result<()>;
}
