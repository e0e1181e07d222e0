//! End-to-end tests against a bound paydrop server.

mod flow_tests;
mod harness;

pub use harness::{TestGateway, TestGatewayConfig};
