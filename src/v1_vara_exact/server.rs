//! Server-side payment requirements for V1 Vara exact scheme.
//!
//! A resource server places these requirements in its 402 challenge; the
//! same object later travels to the facilitator alongside the client's
//! payment header.
//!
//! # Example
//!
//! ```
//! use x402_chain_vara::V1VaraExact;
//! use x402_chain_vara::chain::VaraTokenDeployment;
//!
//! let vara = VaraTokenDeployment::testnet_vara();
//! let requirements = V1VaraExact::payment_requirements(
//!     "kGkLEU3e3XXkJp2WK4eNpVmSab5xUNL9QtmLPh8QfCL2EgotW",
//!     vara.parse("0.5").unwrap(),
//! );
//! assert_eq!(requirements.max_amount_required, "500000000000");
//! ```

use crate::V1VaraExact;
use crate::chain::VaraDeployedTokenAmount;
use crate::v1_vara_exact::{ExactScheme, PaymentRequirements};

/// How long a client may take to pay, unless overridden.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 300;

impl V1VaraExact {
    /// Creates the requirements for a payment of `asset` to `pay_to`.
    ///
    /// Network and asset come from the token deployment; the amount is
    /// rendered as a decimal string in base units.
    pub fn payment_requirements(
        pay_to: impl Into<String>,
        asset: VaraDeployedTokenAmount,
    ) -> PaymentRequirements {
        PaymentRequirements {
            scheme: ExactScheme.to_string(),
            network: asset.token.network.to_string(),
            asset: asset.token.asset.to_string(),
            max_amount_required: asset.amount.to_string(),
            pay_to: pay_to.into(),
            max_timeout_seconds: Some(DEFAULT_MAX_TIMEOUT_SECONDS),
            ..Default::default()
        }
    }
}
