//! Server lifecycle: build the gateway from configuration, bind, serve until
//! shutdown.

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::event::{create_event_channel, GatewayEvent, GatewayEventsChannel};
use crate::gateway::Gateway;
use crate::http::router;
use crate::processor::{PaymentProcessor, RazorpayClient};
use crate::store::{GatewayStore, SledStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Builder for a paydrop server.
pub struct GatewayBuilder {
    config: GatewayConfig,
    store: Option<Arc<dyn GatewayStore>>,
    processor: Option<Arc<dyn PaymentProcessor>>,
}

impl GatewayBuilder {
    /// Create a builder with the given configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            store: None,
            processor: None,
        }
    }

    /// Use `store` instead of opening the on-disk store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn GatewayStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `processor` instead of the Razorpay client.
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn PaymentProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Validate configuration, open the store and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the store cannot be
    /// opened, or the listen address cannot be bound.
    pub async fn build(self) -> Result<RunningGateway> {
        self.config.validate()?;
        info!(
            "Building paydrop: listen={} base_url={} protected_dir={}",
            self.config.listen,
            self.config.base_url,
            self.config.protected_dir.display()
        );

        let store = match self.store {
            Some(store) => store,
            None => {
                let path = self.config.store_path();
                info!("Opening store at {}", path.display());
                Arc::new(SledStore::open(&path)?)
            }
        };
        let processor = match self.processor {
            Some(processor) => processor,
            None => Arc::new(RazorpayClient::new(&self.config.processor)?),
        };

        let (events_tx, _events_rx) = create_event_channel();
        let gateway = Arc::new(Gateway::new(&self.config, store, processor, events_tx));

        for asset_id in gateway.missing_files().await {
            warn!(
                "Catalog entry {asset_id} has no file in {}",
                self.config.protected_dir.display()
            );
        }
        let stats = gateway.store_stats();
        info!(
            "Store holds {} orders and {} outstanding tokens",
            stats.orders, stats.tokens
        );

        let listener = TcpListener::bind(self.config.listen).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(RunningGateway {
            gateway,
            listener,
            local_addr,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }
}

/// Requests shutdown of a running gateway from elsewhere.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting connections and drain.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// A bound paydrop server.
pub struct RunningGateway {
    gateway: Arc<Gateway>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RunningGateway {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The assembled gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Subscribe to gateway events.
    #[must_use]
    pub fn subscribe_events(&self) -> GatewayEventsChannel {
        self.gateway.subscribe_events()
    }

    /// Handle for stopping the server once `run` has taken ownership.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Serve requests until shutdown is requested or Ctrl-C is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails or the store cannot be flushed.
    pub async fn run(self) -> Result<()> {
        let Self {
            gateway,
            listener,
            local_addr,
            shutdown_tx,
            mut shutdown_rx,
        } = self;

        info!("paydrop listening on {local_addr}");
        let _ = gateway.events().send(GatewayEvent::Started {
            addr: local_addr.to_string(),
        });

        let signal = async move {
            tokio::select! {
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    info!("Shutdown signal received");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown");
                    let _ = shutdown_tx.send(true);
                }
            }
        };

        let served = axum::serve(listener, router(Arc::clone(&gateway)))
            .with_graceful_shutdown(signal)
            .await;

        let _ = gateway.events().send(GatewayEvent::ShuttingDown);
        gateway.store().flush()?;
        served?;

        info!("paydrop shutdown complete");
        Ok(())
    }
}
