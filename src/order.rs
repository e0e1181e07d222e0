//! Purchase orchestration: turn a purchase request into a processor order.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use crate::ledger::{self, Order};
use crate::processor::{CreateOrderRequest, PaymentProcessor};
use crate::store::GatewayStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What the client needs to open the processor checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTicket {
    /// Processor order id.
    pub order_id: String,
    /// Amount in minor currency units.
    pub amount: u64,
    /// ISO currency code.
    pub currency: String,
    /// Public processor key id.
    pub key_id: String,
}

/// Creates orders with the processor and records them in the ledger.
pub struct PurchaseOrchestrator {
    catalog: Arc<Catalog>,
    store: Arc<dyn GatewayStore>,
    processor: Arc<dyn PaymentProcessor>,
    currency: String,
    key_id: String,
    events: GatewayEventsSender,
}

impl PurchaseOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn GatewayStore>,
        processor: Arc<dyn PaymentProcessor>,
        currency: String,
        key_id: String,
        events: GatewayEventsSender,
    ) -> Self {
        Self {
            catalog,
            store,
            processor,
            currency,
            key_id,
            events,
        }
    }

    /// Create an order for `asset_id` at `amount` minor units.
    ///
    /// The order is recorded only after the processor confirms it. If the
    /// local write fails after that, the processor knows an order this
    /// gateway does not; verification of it will later fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if `asset_id` is empty or `amount` is zero
    /// - `NotFound` if the asset is not in the catalog
    /// - `Upstream` if the processor fails
    /// - `Storage` if the ledger write fails
    pub async fn create_order(&self, asset_id: &str, amount: u64) -> Result<OrderTicket> {
        if asset_id.is_empty() {
            return Err(Error::InvalidRequest("fileId required".to_string()));
        }
        if amount == 0 {
            return Err(Error::InvalidRequest("amount must be positive".to_string()));
        }
        if !self.catalog.contains(asset_id) {
            debug!("Order requested for unknown asset {asset_id}");
            return Err(Error::NotFound("file not found".to_string()));
        }

        let receipt = ledger::new_receipt();
        let request = CreateOrderRequest {
            amount,
            currency: self.currency.clone(),
            receipt: receipt.clone(),
            auto_capture: true,
        };

        let confirmed = self.processor.create_order(request).await.map_err(|e| {
            warn!("Processor order creation failed for {asset_id}: {e}");
            e
        })?;

        let order = Order {
            order_id: confirmed.id.clone(),
            asset_id: asset_id.to_string(),
            amount: confirmed.amount,
            receipt,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.insert_order(&order) {
            // Processor holds an order the ledger does not; needs reconciliation.
            error!(
                "Order {} confirmed by processor but not recorded: {e}",
                order.order_id
            );
            return Err(e);
        }

        info!(
            "Order {} created for {} ({} {})",
            order.order_id, asset_id, confirmed.amount, confirmed.currency
        );
        let _ = self.events.send(GatewayEvent::OrderCreated {
            order_id: order.order_id.clone(),
            asset_id: order.asset_id,
        });

        Ok(OrderTicket {
            order_id: confirmed.id,
            amount: confirmed.amount,
            currency: confirmed.currency,
            key_id: self.key_id.clone(),
        })
    }
}
