//! The assembled gateway: catalog, ledger, verifier and redemption sharing
//! one store and one processor.

use crate::catalog::Catalog;
use crate::config::GatewayConfig;
use crate::event::{GatewayEventsChannel, GatewayEventsSender};
use crate::order::PurchaseOrchestrator;
use crate::payment::{PaymentVerifier, PaymentVerifierConfig};
use crate::processor::PaymentProcessor;
use crate::redeem::RedemptionHandler;
use crate::store::{GatewayStore, StoreStats};
use crate::vault::FileVault;
use std::sync::Arc;

/// All request-handling components of a running gateway.
pub struct Gateway {
    catalog: Arc<Catalog>,
    store: Arc<dyn GatewayStore>,
    vault: FileVault,
    orders: PurchaseOrchestrator,
    payments: PaymentVerifier,
    redemptions: RedemptionHandler,
    default_amount: u64,
    events: GatewayEventsSender,
}

impl Gateway {
    /// Wire the components from configuration.
    #[must_use]
    pub fn new(
        config: &GatewayConfig,
        store: Arc<dyn GatewayStore>,
        processor: Arc<dyn PaymentProcessor>,
        events: GatewayEventsSender,
    ) -> Self {
        let catalog = Arc::new(Catalog::new(&config.catalog));
        let vault = FileVault::new(config.protected_dir.clone());

        let orders = PurchaseOrchestrator::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            Arc::clone(&processor),
            config.currency.clone(),
            config.processor.key_id.clone(),
            events.clone(),
        );
        let payments = PaymentVerifier::new(
            PaymentVerifierConfig {
                key_secret: config.processor.key_secret.clone(),
                download_ttl: config.download_ttl(),
                single_token_per_order: config.single_token_per_order,
            },
            Arc::clone(&catalog),
            Arc::clone(&store),
            processor,
            vault.clone(),
            events.clone(),
        );
        let redemptions = RedemptionHandler::new(Arc::clone(&store), vault.clone(), events.clone());

        Self {
            catalog,
            store,
            vault,
            orders,
            payments,
            redemptions,
            default_amount: config.default_amount,
            events,
        }
    }

    /// Purchase orchestrator.
    #[must_use]
    pub fn orders(&self) -> &PurchaseOrchestrator {
        &self.orders
    }

    /// Payment verifier.
    #[must_use]
    pub fn payments(&self) -> &PaymentVerifier {
        &self.payments
    }

    /// Redemption handler.
    #[must_use]
    pub fn redemptions(&self) -> &RedemptionHandler {
        &self.redemptions
    }

    /// Amount used when an order request omits it.
    #[must_use]
    pub fn default_amount(&self) -> u64 {
        self.default_amount
    }

    /// Catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Store row counts.
    #[must_use]
    pub fn store_stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn GatewayStore> {
        &self.store
    }

    /// Subscribe to gateway events.
    #[must_use]
    pub fn subscribe_events(&self) -> GatewayEventsChannel {
        self.events.subscribe()
    }

    pub(crate) fn events(&self) -> &GatewayEventsSender {
        &self.events
    }

    /// Catalog entries whose backing file is absent, sorted by asset id.
    pub async fn missing_files(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for (asset_id, filename) in self.catalog.iter() {
            let present = match self.vault.resolve(filename) {
                Ok(path) => self.vault.exists(&path).await,
                Err(_) => false,
            };
            if !present {
                missing.push(asset_id.to_string());
            }
        }
        missing.sort();
        missing
    }
}
