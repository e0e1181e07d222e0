//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /order` | [`handlers::create_order`] |
//! | `POST /verify` | [`handlers::verify_payment`] |
//! | `GET /download?token=` | [`handlers::download`] |
//! | `GET /health` | [`handlers::health`] |
//!
//! JSON routes answer with the envelope in [`response`]; `/download` answers
//! with file bytes or a plain-text error.

pub mod handlers;
pub mod response;

use crate::gateway::Gateway;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared handler state.
pub type AppState = Arc<Gateway>;

/// Build the gateway router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/order", post(handlers::create_order))
        .route("/verify", post(handlers::verify_payment))
        .route("/download", get(handlers::download))
        .route("/health", get(handlers::health))
        .with_state(state)
}
