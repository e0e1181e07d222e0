//! Payment verification for paydrop.
//!
//! A payment is accepted only when both gates pass: the callback signature
//! matches, and the processor itself reports the payment as captured. Only
//! then is a download token minted.
//!
//! # Architecture
//!
//! ```text
//! /verify received
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ HMAC(order|payment) │──── mismatch ───▶ Forbidden
//! └─────────┬───────────┘
//!           ▼
//! ┌─────────────────────┐
//! │ Fetch from processor│──── not captured ─▶ InvalidRequest
//! └─────────┬───────────┘
//!           ▼
//!   Order → asset → file ───── missing ────▶ NotFound
//!           │
//!           ▼
//!     Mint token (TTL)
//!           │
//!    ┌──────┴──────┐
//!    │             │
//!  FIRST        REPEAT (single token per order)
//!    │             │
//!    ▼             ▼
//!  New token   Live token, or Forbidden if spent
//! ```

mod verifier;

pub use verifier::{IssuedToken, PaymentVerifier, PaymentVerifierConfig};
