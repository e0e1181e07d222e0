//! Embedded persistent store backed by sled.
//!
//! ```text
//! {data_dir}/store/   sled database
//!   tree "orders"        order_id -> msgpack(Order)
//!   tree "tokens"        token    -> msgpack(DownloadToken)
//!   tree "order_tokens"  order_id -> token
//! ```

use crate::error::{Error, Result};
use crate::ledger::Order;
use crate::store::{GatewayStore, OrderClaim, StoreStats};
use crate::token::{self, DownloadToken};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

const ORDERS_TREE: &str = "orders";
const TOKENS_TREE: &str = "tokens";
const ORDER_TOKENS_TREE: &str = "order_tokens";

/// sled-backed [`GatewayStore`].
pub struct SledStore {
    db: sled::Db,
    orders: sled::Tree,
    tokens: sled::Tree,
    order_tokens: sled::Tree,
    order_count: AtomicUsize,
    token_count: AtomicUsize,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or sled fails to open.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| Error::Storage(format!("Failed to create store directory: {e}")))?;
        let db = sled::open(path)?;
        debug!("Opened store at {}", path.display());
        Self::from_db(db)
    }

    /// Open a throwaway database that is removed on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if sled fails to open.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    /// Row counts are scanned once here and tracked in memory afterwards.
    fn from_db(db: sled::Db) -> Result<Self> {
        let orders = db.open_tree(ORDERS_TREE)?;
        let tokens = db.open_tree(TOKENS_TREE)?;
        Ok(Self {
            order_count: AtomicUsize::new(orders.len()),
            token_count: AtomicUsize::new(tokens.len()),
            orders,
            tokens,
            order_tokens: db.open_tree(ORDER_TOKENS_TREE)?,
            db,
        })
    }

    /// Compare-and-swap `value` into an empty slot. Returns the current
    /// value on conflict.
    fn insert_if_absent(
        tree: &sled::Tree,
        key: &[u8],
        value: Vec<u8>,
    ) -> Result<Option<sled::IVec>> {
        match tree.compare_and_swap(key, None::<&[u8]>, Some(value))? {
            Ok(()) => Ok(None),
            Err(conflict) => Ok(conflict.current),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}

impl GatewayStore for SledStore {
    fn insert_order(&self, order: &Order) -> Result<()> {
        let value = encode(order)?;
        match Self::insert_if_absent(&self.orders, order.order_id.as_bytes(), value)? {
            None => {
                self.order_count.fetch_add(1, Ordering::Relaxed);
                trace!("Recorded order {}", order.order_id);
                Ok(())
            }
            Some(_) => Err(Error::Storage(format!(
                "duplicate order id {}",
                order.order_id
            ))),
        }
    }

    fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        self.orders
            .get(order_id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn insert_token(&self, record: &DownloadToken) -> Result<bool> {
        let value = encode(record)?;
        let inserted =
            Self::insert_if_absent(&self.tokens, record.token.as_bytes(), value)?.is_none();
        if inserted {
            self.token_count.fetch_add(1, Ordering::Relaxed);
            trace!("Stored token {}", token::log_id(&record.token));
        }
        Ok(inserted)
    }

    fn get_token(&self, token: &str) -> Result<Option<DownloadToken>> {
        self.tokens
            .get(token.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn take_token(&self, token: &str) -> Result<Option<DownloadToken>> {
        let removed = self.tokens.remove(token.as_bytes())?;
        if removed.is_some() {
            self.token_count.fetch_sub(1, Ordering::Relaxed);
        }
        removed.map(|bytes| decode(&bytes)).transpose()
    }

    fn claim_order_token(&self, order_id: &str, token: &str) -> Result<OrderClaim> {
        let current = Self::insert_if_absent(
            &self.order_tokens,
            order_id.as_bytes(),
            token.as_bytes().to_vec(),
        )?;
        match current {
            None => Ok(OrderClaim::Claimed),
            Some(existing) => Ok(OrderClaim::Existing(
                String::from_utf8_lossy(&existing).into_owned(),
            )),
        }
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            orders: self.order_count.load(Ordering::Relaxed),
            tokens: self.token_count.load(Ordering::Relaxed),
        }
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
