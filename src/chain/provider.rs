//! Vara chain provider for facilitator operations.
//!
//! The facilitator never talks to the chain directly. It acquires a
//! [`VaraChainApi`] handle for the network named in the payment requirements
//! and asks that handle to query balances, check signatures, and submit
//! transactions. [`ChainApiSource`] is the scoped, network-keyed acquisition
//! point; [`VaraChainProvider`] is the production implementation, caching
//! one [`GatewayChainApi`] per configured network.

use std::collections::HashMap;
use std::sync::Arc;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{GatewayChainApi, VaraAsset, VaraChainConfig, VaraNetwork};
use crate::v1_vara_exact::types::PaymentPayload;

/// Options passed to the settlement capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleOptions {
    /// Whether to wait for block finality before reporting.
    pub wait_for_finalization: bool,
}

impl SettleOptions {
    /// Report as soon as the transaction is accepted for inclusion.
    pub const SUBMITTED: SettleOptions = SettleOptions {
        wait_for_finalization: false,
    };
}

/// Result of the delegated signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureVerification {
    pub is_valid: bool,
    #[serde(default)]
    pub invalid_reason: Option<String>,
}

/// Result of the delegated settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub success: bool,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A connected handle to one Vara network.
///
/// Implementations own the actual chain work: signature verification against
/// the payer's account, balance lookups, and transaction broadcast.
#[async_trait::async_trait]
pub trait VaraChainApi: Send + Sync {
    /// The network this handle is bound to.
    fn network(&self) -> VaraNetwork;

    /// Returns the balance of `asset` held by `address`, in base units.
    async fn balance_of(
        &self,
        address: &str,
        asset: &VaraAsset,
    ) -> Result<BigUint, VaraProviderError>;

    /// Checks the payload's signature and transaction.
    async fn verify(
        &self,
        payload: &PaymentPayload,
    ) -> Result<SignatureVerification, VaraProviderError>;

    /// Submits the payload's transaction.
    async fn settle(
        &self,
        payload: &PaymentPayload,
        options: SettleOptions,
    ) -> Result<Submission, VaraProviderError>;
}

/// Hands out chain handles keyed by network.
#[async_trait::async_trait]
pub trait ChainApiSource: Send + Sync {
    /// Acquires a handle for `network`.
    async fn acquire(
        &self,
        network: VaraNetwork,
    ) -> Result<Arc<dyn VaraChainApi>, VaraProviderError>;

    /// Networks this source can serve.
    fn networks(&self) -> Vec<VaraNetwork>;
}

/// Provider for interacting with Vara networks through chain gateways.
///
/// Handles are built lazily on first use and reused for every later request
/// on the same network.
///
/// # Example
///
/// ```
/// use x402_chain_vara::chain::{VaraChainConfig, VaraChainProvider, VaraNetwork};
///
/// let provider = VaraChainProvider::from_configs(vec![VaraChainConfig::new(
///     VaraNetwork::Testnet,
///     "http://127.0.0.1:3402/vara-testnet/",
/// )]);
/// assert!(provider.is_configured(VaraNetwork::Testnet));
/// ```
pub struct VaraChainProvider {
    configs: HashMap<VaraNetwork, VaraChainConfig>,
    client: reqwest::Client,
    handles: RwLock<HashMap<VaraNetwork, Arc<GatewayChainApi>>>,
}

impl VaraChainProvider {
    /// Creates a provider serving every network in `configs`.
    ///
    /// A later config for the same network replaces an earlier one.
    pub fn from_configs(configs: impl IntoIterator<Item = VaraChainConfig>) -> Self {
        let configs = configs
            .into_iter()
            .map(|config| (config.network, config))
            .collect();
        Self {
            configs,
            client: reqwest::Client::new(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `true` if `network` has a gateway configured.
    pub fn is_configured(&self, network: VaraNetwork) -> bool {
        self.configs.contains_key(&network)
    }

    /// Returns the configuration for `network`, if any.
    pub fn config(&self, network: VaraNetwork) -> Option<&VaraChainConfig> {
        self.configs.get(&network)
    }
}

#[async_trait::async_trait]
impl ChainApiSource for VaraChainProvider {
    async fn acquire(
        &self,
        network: VaraNetwork,
    ) -> Result<Arc<dyn VaraChainApi>, VaraProviderError> {
        if let Some(handle) = self.handles.read().await.get(&network) {
            let handle: Arc<dyn VaraChainApi> = handle.clone();
            return Ok(handle);
        }

        let config = self
            .configs
            .get(&network)
            .ok_or(VaraProviderError::UnconfiguredNetwork(network))?;

        let mut handles = self.handles.write().await;
        let handle = match handles.get(&network) {
            Some(handle) => handle.clone(),
            None => {
                let handle = Arc::new(GatewayChainApi::new(self.client.clone(), config)?);
                tracing::debug!(
                    network = %network,
                    gateway = %config.gateway_url,
                    "Connected chain handle"
                );
                handles.insert(network, handle.clone());
                handle
            }
        };
        let handle: Arc<dyn VaraChainApi> = handle;
        Ok(handle)
    }

    fn networks(&self) -> Vec<VaraNetwork> {
        VaraNetwork::ALL
            .into_iter()
            .filter(|network| self.configs.contains_key(network))
            .collect()
    }
}

/// Errors that can occur while talking to a Vara network.
#[derive(Debug, thiserror::Error)]
pub enum VaraProviderError {
    /// No gateway is configured for the requested network.
    #[error("No chain connection configured for network {0}")]
    UnconfiguredNetwork(VaraNetwork),

    /// The gateway URL could not be parsed or joined.
    #[error("Invalid gateway URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Failed to reach the gateway.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The call did not complete within the configured timeout.
    #[error("Chain call timed out: {0}")]
    Timeout(String),

    /// The gateway answered with a non-success status.
    #[error("Gateway returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The gateway answer could not be decoded.
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    /// Failed to query account state.
    #[error("Query error: {0}")]
    QueryError(String),
}
