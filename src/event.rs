//! Gateway event system.

use tokio::sync::broadcast;

/// Events emitted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Server is accepting connections.
    Started {
        /// Bound address.
        addr: String,
    },

    /// Server is shutting down.
    ShuttingDown,

    /// An order was created with the processor and recorded.
    OrderCreated {
        /// Processor order id.
        order_id: String,
        /// Asset being purchased.
        asset_id: String,
    },

    /// A payment was verified and a download token issued.
    TokenMinted {
        /// Order the payment was for.
        order_id: String,
    },

    /// A token was consumed and its file served.
    TokenRedeemed {
        /// Name of the file served.
        filename: String,
    },

    /// A token was presented after expiry and reaped.
    TokenExpired,
}

/// Channel for receiving gateway events.
pub type GatewayEventsChannel = broadcast::Receiver<GatewayEvent>;

/// Sender for gateway events.
pub type GatewayEventsSender = broadcast::Sender<GatewayEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (GatewayEventsSender, GatewayEventsChannel) {
    broadcast::channel(256)
}
