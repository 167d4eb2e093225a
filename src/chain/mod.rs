//! Core Vara chain types, configuration, and provider.
//!
//! This module provides the fundamental types for interacting with
//! the Vara blockchain within the x402 protocol:
//!
//! - [`VaraNetwork`] - Accepted network identifiers (`vara`, `vara-testnet`)
//! - [`VaraAsset`] - Native marker or token identifier
//! - [`VaraTokenDeployment`] - Token deployment info
//! - [`VaraChainConfig`] - Configuration for reaching a chain gateway
//! - [`ChainApiSource`] / [`VaraChainApi`] - Network-keyed chain handles

pub mod types;
pub use types::*;

pub mod config;
pub use config::*;

#[cfg(feature = "facilitator")]
pub mod provider;
#[cfg(feature = "facilitator")]
pub use provider::*;

#[cfg(feature = "facilitator")]
pub mod gateway;
#[cfg(feature = "facilitator")]
pub use gateway::*;
