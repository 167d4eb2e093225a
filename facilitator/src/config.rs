//! Facilitator server configuration.
//!
//! Configuration comes from the process environment, optionally seeded from
//! a `.env` file.
//!
//! # Environment Variables
//!
//! - `BIND_ADDR`                - Full bind address; takes precedence over `HOST`/`PORT`
//! - `HOST`                     - Bind host (default: 0.0.0.0)
//! - `PORT`                     - Bind port (default: 4020)
//! - `LOG_LEVEL`                - Log filter used when `RUST_LOG` is unset (default: info)
//! - `VARA_GATEWAY_URL`         - Chain gateway for `vara` (mainnet disabled if unset)
//! - `VARA_TESTNET_GATEWAY_URL` - Chain gateway for `vara-testnet`
//!   (default: http://127.0.0.1:3402/vara-testnet/)
//! - `CHAIN_TIMEOUT_SECS`       - Timeout for each chain call (default: 30)
//! - `RATE_LIMIT_PER_MINUTE`    - Verify/settle requests per minute (default: 100)
//! - `BODY_LIMIT_BYTES`         - Maximum request body size (default: 2 MiB)

use std::str::FromStr;
use std::time::Duration;

use url::Url;
use x402_chain_vara::chain::{VaraChainConfig, VaraNetwork};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 4020;
const DEFAULT_TESTNET_GATEWAY: &str = "http://127.0.0.1:3402/vara-testnet/";
const DEFAULT_RATE_LIMIT_PER_MINUTE: u64 = 100;
const DEFAULT_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Top-level facilitator configuration.
#[derive(Debug, Clone)]
pub struct FacilitatorConfig {
    pub bind_address: String,
    pub log_level: String,
    /// One entry per enabled network.
    pub chains: Vec<VaraChainConfig>,
    pub rate_limit_per_minute: u64,
    pub body_limit_bytes: usize,
}

impl FacilitatorConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_address = match lookup("BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port: u16 = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
                let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
                format!("{host}:{port}")
            }
        };
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let timeout = Duration::from_secs(parse_or(
            &lookup,
            "CHAIN_TIMEOUT_SECS",
            x402_chain_vara::chain::DEFAULT_CHAIN_TIMEOUT.as_secs(),
        )?);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "CHAIN_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let gateways = [
            (VaraNetwork::Mainnet, "VARA_GATEWAY_URL", None),
            (
                VaraNetwork::Testnet,
                "VARA_TESTNET_GATEWAY_URL",
                Some(DEFAULT_TESTNET_GATEWAY),
            ),
        ];
        let mut chains = Vec::new();
        for (network, key, default) in gateways {
            let Some(url) = lookup(key).or_else(|| default.map(str::to_string)) else {
                continue;
            };
            if url.trim().is_empty() {
                continue;
            }
            Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
                key,
                reason: e.to_string(),
            })?;
            chains.push(VaraChainConfig::new(network, url).with_timeout(timeout));
        }
        if chains.is_empty() {
            return Err(ConfigError::NoNetworks);
        }

        let rate_limit_per_minute =
            parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", DEFAULT_RATE_LIMIT_PER_MINUTE)?;
        if rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_PER_MINUTE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_address,
            log_level,
            chains,
            rate_limit_per_minute,
            body_limit_bytes: parse_or(&lookup, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid URL in {key}: {reason}")]
    InvalidUrl { key: &'static str, reason: String },

    #[error("No Vara network configured: set VARA_GATEWAY_URL or VARA_TESTNET_GATEWAY_URL")]
    NoNetworks,
}
