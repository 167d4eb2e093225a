//! V1 Vara "exact" payment scheme implementation.
//!
//! This module implements the "exact" payment scheme for the Vara blockchain
//! using the V1 x402 protocol (`x402Version: 1`, flat network names).
//!
//! # Payment Model
//!
//! 1. A resource server answers 402 with [`PaymentRequirements`](types::PaymentRequirements)
//! 2. The client signs a Vara transaction and sends it, base64-encoded, in
//!    the `X-PAYMENT` header
//! 3. The resource server forwards the header and its requirements to the
//!    facilitator's `verify` endpoint before serving the response
//! 4. After serving, it calls `settle`, and the facilitator submits the
//!    transaction to the chain
//!
//! The facilitator checks the protocol contract locally and leaves signature
//! verification, balance reads and submission to a
//! [`VaraChainApi`](crate::chain::VaraChainApi) handle.

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "facilitator")]
pub mod facilitator;
#[cfg(feature = "facilitator")]
pub use facilitator::*;

pub mod decode;
pub mod types;
pub mod validate;

pub use decode::*;
pub use types::*;

/// The V1 Vara "exact" payment scheme.
///
/// Serves as the scheme identifier and as the factory for payment
/// requirements on the server side.
#[derive(Debug, Clone, Copy)]
pub struct V1VaraExact;

impl V1VaraExact {
    /// The chain namespace this scheme settles on.
    pub fn namespace(&self) -> &str {
        crate::chain::VARA_NAMESPACE
    }

    /// The scheme name used on the wire.
    pub fn scheme(&self) -> &str {
        ExactScheme.as_ref()
    }

    /// The x402 protocol version this scheme speaks.
    pub fn x402_version(&self) -> u64 {
        X402_VERSION
    }

    /// Stable identifier, e.g. `v1-vara-exact`.
    pub fn id(&self) -> String {
        format!("v{}-{}-{}", self.x402_version(), self.namespace(), self.scheme())
    }
}
