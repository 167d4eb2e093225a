//! x402 facilitator HTTP server for the Vara blockchain.
//!
//! # Endpoints
//!
//! - `POST /api/facilitator/verify` - Verify a payment without moving funds
//! - `POST /api/facilitator/settle` - Submit a payment to the chain
//! - `GET  /supported`              - List supported payment kinds
//! - `GET  /health`                 - Health check with configured networks
//! - `GET  /metrics`                - Prometheus-format metrics
//!
//! See [`config`] for the environment variables read at startup.

pub mod config;
pub mod handlers;
pub mod metrics;

pub use config::{ConfigError, FacilitatorConfig};
pub use handlers::{AppState, Limits, router};
