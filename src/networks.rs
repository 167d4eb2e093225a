//! Known Vara networks and token deployments.
//!
//! This module provides convenient methods to get network identifiers and
//! token deployment information for well-known Vara networks.

use x402_types::chain::ChainId;

use crate::chain::{VaraAsset, VaraNetwork, VaraTokenDeployment};

/// Decimal places of the native VARA token.
pub const VARA_DECIMALS: u8 = 12;

/// Trait providing convenient methods for well-known Vara networks.
///
/// # Example
///
/// ```
/// use x402_chain_vara::KnownNetworkVara;
/// use x402_types::chain::ChainId;
///
/// let testnet: ChainId = ChainId::vara_testnet();
/// assert_eq!(testnet.to_string(), "vara:testnet");
/// ```
pub trait KnownNetworkVara<A> {
    /// Returns the instance for Vara mainnet.
    fn vara_mainnet() -> A;
    /// Returns the instance for Vara testnet.
    fn vara_testnet() -> A;
}

impl KnownNetworkVara<ChainId> for ChainId {
    fn vara_mainnet() -> ChainId {
        VaraNetwork::Mainnet.as_chain_id()
    }

    fn vara_testnet() -> ChainId {
        VaraNetwork::Testnet.as_chain_id()
    }
}

impl KnownNetworkVara<VaraNetwork> for VaraNetwork {
    fn vara_mainnet() -> VaraNetwork {
        VaraNetwork::Mainnet
    }

    fn vara_testnet() -> VaraNetwork {
        VaraNetwork::Testnet
    }
}

/// Marker type for the native VARA token.
pub struct NativeVara;

impl KnownNetworkVara<VaraTokenDeployment> for NativeVara {
    fn vara_mainnet() -> VaraTokenDeployment {
        VaraTokenDeployment {
            network: VaraNetwork::Mainnet,
            asset: VaraAsset::Native,
            decimals: VARA_DECIMALS,
        }
    }

    fn vara_testnet() -> VaraTokenDeployment {
        VaraTokenDeployment {
            network: VaraNetwork::Testnet,
            asset: VaraAsset::Native,
            decimals: VARA_DECIMALS,
        }
    }
}

impl VaraTokenDeployment {
    /// Returns native VARA on mainnet.
    pub fn mainnet_vara() -> Self {
        NativeVara::vara_mainnet()
    }

    /// Returns native VARA on testnet.
    pub fn testnet_vara() -> Self {
        NativeVara::vara_testnet()
    }
}
