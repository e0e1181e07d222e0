//! In-memory store for tests and ephemeral runs.

use crate::error::{Error, Result};
use crate::ledger::Order;
use crate::store::{GatewayStore, OrderClaim, StoreStats};
use crate::token::DownloadToken;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Default)]
struct Tables {
    orders: HashMap<String, Order>,
    tokens: HashMap<String, DownloadToken>,
    order_tokens: HashMap<String, String>,
}

/// [`GatewayStore`] held entirely in memory behind one mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GatewayStore for MemoryStore {
    fn insert_order(&self, order: &Order) -> Result<()> {
        match self.tables.lock().orders.entry(order.order_id.clone()) {
            Entry::Occupied(_) => Err(Error::Storage(format!(
                "duplicate order id {}",
                order.order_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(())
            }
        }
    }

    fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.tables.lock().orders.get(order_id).cloned())
    }

    fn insert_token(&self, token: &DownloadToken) -> Result<bool> {
        match self.tables.lock().tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(true)
            }
        }
    }

    fn get_token(&self, token: &str) -> Result<Option<DownloadToken>> {
        Ok(self.tables.lock().tokens.get(token).cloned())
    }

    fn take_token(&self, token: &str) -> Result<Option<DownloadToken>> {
        Ok(self.tables.lock().tokens.remove(token))
    }

    fn claim_order_token(&self, order_id: &str, token: &str) -> Result<OrderClaim> {
        match self.tables.lock().order_tokens.entry(order_id.to_string()) {
            Entry::Occupied(existing) => Ok(OrderClaim::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(token.to_string());
                Ok(OrderClaim::Claimed)
            }
        }
    }

    fn stats(&self) -> StoreStats {
        let tables = self.tables.lock();
        StoreStats {
            orders: tables.orders.len(),
            tokens: tables.tokens.len(),
        }
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
