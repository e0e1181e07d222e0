//! Order records.
//!
//! An order links a processor-assigned order id to the asset being bought.
//! Orders are appended once and never mutated or deleted.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Prefix of locally generated receipt ids.
pub const RECEIPT_PREFIX: &str = "rcpt_";

/// Random bytes in a receipt id.
const RECEIPT_BYTES: usize = 8;

/// A recorded purchase intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Processor-assigned order id.
    pub order_id: String,
    /// Asset the order pays for.
    pub asset_id: String,
    /// Amount in minor currency units, as confirmed by the processor.
    pub amount: u64,
    /// Locally generated receipt id.
    pub receipt: String,
    /// When the order was recorded.
    pub created_at: DateTime<Utc>,
}

/// Generate a collision-resistant receipt id (`rcpt_` + 16 hex chars).
#[must_use]
pub fn new_receipt() -> String {
    let mut bytes = [0u8; RECEIPT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{RECEIPT_PREFIX}{}", hex::encode(bytes))
}
