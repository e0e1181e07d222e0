//! Payment processor boundary.
//!
//! The gateway only needs two calls from the processor: create an order, and
//! fetch the authoritative status of a payment. Both sit behind
//! [`PaymentProcessor`] so the gateway can run against Razorpay in production
//! and a scripted processor in tests.
//!
//! Callback authenticity is checked locally with the shared secret, see
//! [`signature`].

mod razorpay;
pub mod signature;

pub use razorpay::RazorpayClient;

use crate::error::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for a new processor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in minor currency units.
    pub amount: u64,
    /// ISO currency code.
    pub currency: String,
    /// Local receipt id for correlation.
    pub receipt: String,
    /// Capture the payment automatically once authorized.
    pub auto_capture: bool,
}

/// Order as confirmed by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessorOrder {
    /// Processor-assigned order id.
    pub id: String,
    /// Amount in minor currency units.
    pub amount: u64,
    /// ISO currency code.
    pub currency: String,
}

/// Lifecycle state of a payment as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PaymentState {
    /// Payment created, nothing collected yet.
    Created,
    /// Funds authorized but not captured.
    Authorized,
    /// Funds captured.
    Captured,
    /// Funds returned.
    Refunded,
    /// Payment failed.
    Failed,
    /// Any status this gateway does not know about.
    Other(String),
}

impl From<String> for PaymentState {
    fn from(status: String) -> Self {
        match status.as_str() {
            "created" => Self::Created,
            "authorized" => Self::Authorized,
            "captured" => Self::Captured,
            "refunded" => Self::Refunded,
            "failed" => Self::Failed,
            _ => Self::Other(status),
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Authorized => f.write_str("authorized"),
            Self::Captured => f.write_str("captured"),
            Self::Refunded => f.write_str("refunded"),
            Self::Failed => f.write_str("failed"),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// Authoritative view of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentInfo {
    /// Processor payment id.
    pub id: String,
    /// Current state.
    pub status: PaymentState,
    /// Order the payment was made against, when the processor reports it.
    #[serde(default)]
    pub order_id: Option<String>,
}

impl PaymentInfo {
    /// True when the funds have actually been captured.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.status == PaymentState::Captured
    }
}

/// External payment processor.
pub trait PaymentProcessor: Send + Sync {
    /// Create an order the client can pay against.
    ///
    /// Fails with `Error::Upstream` if the processor is unreachable, times
    /// out, or rejects the request.
    fn create_order(&self, request: CreateOrderRequest) -> BoxFuture<'_, Result<ProcessorOrder>>;

    /// Fetch the authoritative state of a payment.
    ///
    /// Fails with `Error::Upstream` if the processor is unreachable, times
    /// out, or rejects the request.
    fn fetch_payment<'a>(&'a self, payment_id: &'a str) -> BoxFuture<'a, Result<PaymentInfo>>;
}
