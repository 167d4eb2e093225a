//! Vara blockchain support for the x402 payment protocol.
//!
//! This crate provides the facilitator side of the x402 "exact" payment
//! scheme on Vara. A resource server hands the facilitator a client's
//! payment header together with its own payment requirements; the
//! facilitator checks the protocol contract and then delegates the chain
//! work (signature verification, balance lookup, transaction submission)
//! to a network-keyed chain handle.
//!
//! # Architecture
//!
//! 1. **Decode**: the base64 `X-PAYMENT` header becomes a [`PaymentPayload`](v1_vara_exact::PaymentPayload)
//! 2. **Validate**: version, required fields, scheme, network, and payload
//!    vs. requirements, in a fixed order with fail-fast semantics
//! 3. **Gate** (verify): payer balance against `maxAmountRequired`, presence
//!    of signature and transaction
//! 4. **Delegate**: the chain handle verifies or submits
//! 5. **Encode**: every outcome maps onto one of two fixed response shapes
//!
//! # Feature Flags
//!
//! - `server` - Payment requirements for resource servers
//! - `facilitator` - Verification and settlement pipeline, chain provider
//!   and gateway client
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use x402_chain_vara::V1VaraExactFacilitator;
//! use x402_chain_vara::chain::{VaraChainConfig, VaraChainProvider, VaraNetwork};
//!
//! let provider = VaraChainProvider::from_configs(vec![VaraChainConfig::new(
//!     VaraNetwork::Testnet,
//!     "http://127.0.0.1:3402/vara-testnet/",
//! )]);
//! let facilitator = V1VaraExactFacilitator::new(Arc::new(provider));
//! let outcome = facilitator.verify(&request).await;
//! ```

pub mod chain;
pub mod v1_vara_exact;

mod networks;
pub use networks::*;

pub use v1_vara_exact::V1VaraExact;

#[cfg(feature = "facilitator")]
pub use v1_vara_exact::facilitator::V1VaraExactFacilitator;
