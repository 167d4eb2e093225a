//! Wire format types for Vara chain interactions.
//!
//! This module provides types that handle serialization and deserialization
//! of Vara-specific values in the x402 protocol wire format.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use x402_types::chain::ChainId;

/// The CAIP-2 namespace for Vara chains.
pub const VARA_NAMESPACE: &str = "vara";

/// The asset identifier that designates the chain-native VARA token.
pub const NATIVE_ASSET: &str = "native";

// ============================================================================
// VaraNetwork
// ============================================================================

/// A Vara network accepted by the facilitator.
///
/// On the x402 wire, networks are identified by flat names (`vara`,
/// `vara-testnet`). Each one maps onto a CAIP-2 chain ID in the `vara`
/// namespace.
///
/// # Example
///
/// ```
/// use x402_chain_vara::chain::VaraNetwork;
///
/// let network: VaraNetwork = "vara-testnet".parse().unwrap();
/// assert_eq!(network, VaraNetwork::Testnet);
/// assert_eq!(network.as_chain_id().to_string(), "vara:testnet");
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum VaraNetwork {
    /// Vara mainnet (`vara`).
    Mainnet,
    /// Vara testnet (`vara-testnet`).
    Testnet,
}

impl VaraNetwork {
    /// Every network the facilitator accepts, in display order.
    pub const ALL: [VaraNetwork; 2] = [VaraNetwork::Mainnet, VaraNetwork::Testnet];

    /// Returns the x402 wire identifier of this network.
    pub fn as_str(&self) -> &'static str {
        match self {
            VaraNetwork::Mainnet => "vara",
            VaraNetwork::Testnet => "vara-testnet",
        }
    }

    /// Returns the CAIP-2 chain reference (`mainnet` or `testnet`).
    pub fn reference(&self) -> &'static str {
        match self {
            VaraNetwork::Mainnet => "mainnet",
            VaraNetwork::Testnet => "testnet",
        }
    }

    /// Converts this network to a CAIP-2 [`ChainId`].
    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(VARA_NAMESPACE, self.reference())
    }

    /// Renders the accepted wire identifiers as a comma-separated list.
    pub fn valid_networks() -> String {
        VaraNetwork::ALL
            .iter()
            .map(VaraNetwork::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for VaraNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaraNetwork {
    type Err = VaraNetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vara" => Ok(VaraNetwork::Mainnet),
            "vara-testnet" => Ok(VaraNetwork::Testnet),
            other => Err(VaraNetworkParseError::UnknownNetwork(other.to_string())),
        }
    }
}

impl Serialize for VaraNetwork {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VaraNetwork {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<VaraNetwork> for ChainId {
    fn from(value: VaraNetwork) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for VaraNetwork {
    type Error = VaraNetworkParseError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace != VARA_NAMESPACE {
            return Err(VaraNetworkParseError::InvalidNamespace(
                value.namespace.clone(),
            ));
        }
        match value.reference.as_str() {
            "mainnet" => Ok(VaraNetwork::Mainnet),
            "testnet" => Ok(VaraNetwork::Testnet),
            other => Err(VaraNetworkParseError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Error returned when a string or chain ID does not name a Vara network.
#[derive(Debug, thiserror::Error)]
pub enum VaraNetworkParseError {
    /// The chain ID namespace is not `vara`.
    #[error("Invalid namespace {0}, expected vara")]
    InvalidNamespace(String),
    /// The identifier is not one of the known Vara networks.
    #[error("Unknown Vara network {0}")]
    UnknownNetwork(String),
}

// ============================================================================
// VaraAsset
// ============================================================================

/// An asset identifier as it appears in payment requirements.
///
/// The distinguished [`NATIVE_ASSET`] marker selects the chain-native VARA
/// balance. Any other value is treated as an opaque token identifier and
/// passed through to the chain untouched.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum VaraAsset {
    /// The native VARA token.
    Native,
    /// A token identified by its program or contract ID.
    Token(String),
}

impl VaraAsset {
    /// Returns the wire identifier of this asset.
    pub fn as_str(&self) -> &str {
        match self {
            VaraAsset::Native => NATIVE_ASSET,
            VaraAsset::Token(id) => id,
        }
    }

    /// Returns `true` for the native VARA token.
    pub fn is_native(&self) -> bool {
        matches!(self, VaraAsset::Native)
    }
}

impl From<&str> for VaraAsset {
    fn from(value: &str) -> Self {
        if value == NATIVE_ASSET {
            VaraAsset::Native
        } else {
            VaraAsset::Token(value.to_string())
        }
    }
}

impl Display for VaraAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VaraAsset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VaraAsset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(VaraAsset::from(s.as_str()))
    }
}

// ============================================================================
// VaraTokenDeployment
// ============================================================================

/// Information about a token available on a Vara network.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VaraTokenDeployment {
    /// The network this token lives on.
    pub network: VaraNetwork,
    /// The asset identifier used in payment requirements.
    pub asset: VaraAsset,
    /// Number of decimal places (12 for native VARA).
    pub decimals: u8,
}

/// A token amount paired with its deployment information.
#[derive(Debug, Clone)]
pub struct VaraDeployedTokenAmount {
    /// The amount in the token's smallest unit.
    pub amount: BigUint,
    /// The token deployment this amount refers to.
    pub token: VaraTokenDeployment,
}

impl VaraTokenDeployment {
    /// Creates a token amount from a raw value already in base units.
    pub fn amount(&self, v: impl Into<BigUint>) -> VaraDeployedTokenAmount {
        VaraDeployedTokenAmount {
            amount: v.into(),
            token: self.clone(),
        }
    }

    /// Parses a human-readable amount string into base units.
    ///
    /// Accepts formats like `"10.50"` or `"1000"`. The amount is scaled by the
    /// token's decimal places without any loss of precision.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a plain decimal number or carries
    /// more fractional digits than the token supports.
    pub fn parse(&self, v: &str) -> Result<VaraDeployedTokenAmount, VaraAmountParseError> {
        let (whole, frac) = match v.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (v, ""),
        };

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(frac) {
            return Err(VaraAmountParseError::InvalidFormat(v.to_string()));
        }

        let frac_len = frac.len();
        if frac_len > usize::from(self.decimals) {
            return Err(VaraAmountParseError::TooManyDecimals {
                got: frac_len,
                max: self.decimals,
            });
        }

        let padding = "0".repeat(usize::from(self.decimals) - frac_len);
        let digits = format!("{whole}{frac}{padding}");
        let amount = BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| VaraAmountParseError::InvalidFormat(v.to_string()))?;

        Ok(VaraDeployedTokenAmount {
            amount,
            token: self.clone(),
        })
    }
}

/// Error returned when parsing a token amount.
#[derive(Debug, thiserror::Error)]
pub enum VaraAmountParseError {
    /// The input string is not a valid decimal number.
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
    /// Too many decimal places for the token.
    #[error("Too many decimal places: got {got}, max {max}")]
    TooManyDecimals { got: usize, max: u8 },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_wire_names() {
        assert_eq!(VaraNetwork::Mainnet.to_string(), "vara");
        assert_eq!(VaraNetwork::Testnet.to_string(), "vara-testnet");
        assert_eq!(
            "vara".parse::<VaraNetwork>().unwrap(),
            VaraNetwork::Mainnet
        );
        assert!("".parse::<VaraNetwork>().is_err());
        assert!("Vara".parse::<VaraNetwork>().is_err());
        assert!("vara:testnet".parse::<VaraNetwork>().is_err());
    }

    #[test]
    fn test_network_to_chain_id() {
        let chain_id: ChainId = VaraNetwork::Mainnet.into();
        assert_eq!(chain_id.namespace, "vara");
        assert_eq!(chain_id.reference, "mainnet");
        assert_eq!(chain_id.to_string(), "vara:mainnet");
    }

    #[test]
    fn test_chain_id_to_network() {
        let chain_id = ChainId::new("vara", "testnet");
        assert_eq!(
            VaraNetwork::try_from(&chain_id).unwrap(),
            VaraNetwork::Testnet
        );
        let wrong = ChainId::new("eip155", "8453");
        assert!(VaraNetwork::try_from(&wrong).is_err());
    }

    #[test]
    fn test_valid_networks_listing() {
        assert_eq!(VaraNetwork::valid_networks(), "vara, vara-testnet");
    }

    #[test]
    fn test_asset_native_marker() {
        assert!(VaraAsset::from("native").is_native());
        let token = VaraAsset::from("0xabc");
        assert!(!token.is_native());
        assert_eq!(token.as_str(), "0xabc");
    }

    #[test]
    fn test_asset_serde() {
        let json = serde_json::to_string(&VaraAsset::Native).unwrap();
        assert_eq!(json, "\"native\"");
        let token: VaraAsset = serde_json::from_str("\"0xdead\"").unwrap();
        assert_eq!(token, VaraAsset::Token("0xdead".to_string()));
    }

    #[test]
    fn test_parse_amount_beyond_u128() {
        let token = VaraTokenDeployment {
            network: VaraNetwork::Mainnet,
            asset: VaraAsset::Native,
            decimals: 12,
        };
        let amount = token.parse("340282366920938463463374607431768211456").unwrap();
        assert_eq!(
            amount.amount.to_string(),
            "340282366920938463463374607431768211456000000000000"
        );
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        let token = VaraTokenDeployment {
            network: VaraNetwork::Testnet,
            asset: VaraAsset::Native,
            decimals: 12,
        };
        assert!(token.parse("1.2.3").is_err());
        assert!(token.parse("-1").is_err());
        assert!(token.parse(".5").is_err());
        assert!(token.parse("1.0000000000001").is_err());
    }
}
