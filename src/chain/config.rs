//! Configuration types for connecting to a Vara chain gateway.
//!
//! This module provides configuration structures used to initialize
//! a Vara chain provider for facilitator operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::VaraNetwork;

/// Timeout applied to every chain call when none is configured.
pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a single Vara network connection.
///
/// This configuration is used to initialize a
/// [`VaraChainProvider`](super::provider::VaraChainProvider) for
/// facilitator-side operations (verification and settlement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaraChainConfig {
    /// The network this connection serves.
    pub network: VaraNetwork,
    /// Base URL of the chain gateway for this network.
    pub gateway_url: String,
    /// Upper bound on each balance, verify, or settle call.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

impl VaraChainConfig {
    /// Creates a configuration with the default timeout.
    pub fn new(network: VaraNetwork, gateway_url: impl Into<String>) -> Self {
        Self {
            network,
            gateway_url: gateway_url.into(),
            timeout: DEFAULT_CHAIN_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_timeout() -> Duration {
    DEFAULT_CHAIN_TIMEOUT
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
