//! HTTP client for a Vara chain gateway.
//!
//! The gateway is the service that owns the Vara chain SDK: it checks payment
//! signatures against on-chain accounts, reads balances, and broadcasts
//! transactions. [`GatewayChainApi`] speaks its small JSON protocol:
//!
//! - `POST balance` with `{network, address, asset}` answers `{balance}`
//!   where `balance` is a decimal string in base units
//! - `POST verify` with `{network, payload}` answers `{isValid, invalidReason}`
//! - `POST settle` with `{network, payload, waitForFinalization}` answers
//!   `{success, txHash, message}`
//!
//! Paths are resolved relative to the configured gateway URL, so a base of
//! `http://gateway/vara-testnet/` posts to `http://gateway/vara-testnet/verify`.

use std::str::FromStr;
use std::time::Duration;

use num_bigint::BigUint;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use x402_types::chain::{ChainId, ChainProviderOps};

use super::{
    SettleOptions, SignatureVerification, Submission, VaraAsset, VaraChainApi, VaraChainConfig,
    VaraNetwork, VaraProviderError,
};
use crate::v1_vara_exact::types::PaymentPayload;

#[derive(Serialize)]
struct BalanceRequest<'a> {
    network: VaraNetwork,
    address: &'a str,
    asset: &'a VaraAsset,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: String,
}

#[derive(Serialize)]
struct VerifyCall<'a> {
    network: VaraNetwork,
    payload: &'a PaymentPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettleCall<'a> {
    network: VaraNetwork,
    payload: &'a PaymentPayload,
    #[serde(flatten)]
    options: SettleOptions,
}

/// A [`VaraChainApi`] handle backed by a chain gateway.
#[derive(Debug, Clone)]
pub struct GatewayChainApi {
    network: VaraNetwork,
    client: Client,
    balance_url: Url,
    verify_url: Url,
    settle_url: Url,
    timeout: Duration,
}

impl GatewayChainApi {
    /// Creates a handle for the network described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`VaraProviderError::InvalidUrl`] if the gateway URL is not an
    /// absolute URL.
    pub fn new(client: Client, config: &VaraChainConfig) -> Result<Self, VaraProviderError> {
        let invalid = |reason: String| VaraProviderError::InvalidUrl {
            url: config.gateway_url.clone(),
            reason,
        };
        let mut base = Url::parse(&config.gateway_url).map_err(|e| invalid(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |path: &str| base.join(path).map_err(|e| invalid(e.to_string()));
        Ok(Self {
            network: config.network,
            client,
            balance_url: join("balance")?,
            verify_url: join("verify")?,
            settle_url: join("settle")?,
            timeout: config.timeout,
        })
    }

    async fn post<B, R>(&self, url: &Url, body: &B) -> Result<R, VaraProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VaraProviderError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| VaraProviderError::MalformedResponse(format!("{url}: {e}")))
    }
}

fn transport_error(url: &Url, e: &reqwest::Error) -> VaraProviderError {
    if e.is_timeout() {
        VaraProviderError::Timeout(url.to_string())
    } else {
        VaraProviderError::ConnectionError(format!("{url}: {e}"))
    }
}

#[async_trait::async_trait]
impl VaraChainApi for GatewayChainApi {
    fn network(&self) -> VaraNetwork {
        self.network
    }

    async fn balance_of(
        &self,
        address: &str,
        asset: &VaraAsset,
    ) -> Result<BigUint, VaraProviderError> {
        let request = BalanceRequest {
            network: self.network,
            address,
            asset,
        };
        let response: BalanceResponse = self.post(&self.balance_url, &request).await?;
        BigUint::from_str(response.balance.trim()).map_err(|e| {
            VaraProviderError::QueryError(format!(
                "Invalid balance '{}' for {address}: {e}",
                response.balance
            ))
        })
    }

    async fn verify(
        &self,
        payload: &PaymentPayload,
    ) -> Result<SignatureVerification, VaraProviderError> {
        let call = VerifyCall {
            network: self.network,
            payload,
        };
        self.post(&self.verify_url, &call).await
    }

    async fn settle(
        &self,
        payload: &PaymentPayload,
        options: SettleOptions,
    ) -> Result<Submission, VaraProviderError> {
        let call = SettleCall {
            network: self.network,
            payload,
            options,
        };
        self.post(&self.settle_url, &call).await
    }
}

impl ChainProviderOps for GatewayChainApi {
    fn signer_addresses(&self) -> Vec<String> {
        // Transactions arrive signed by the payer; the facilitator holds no keys.
        vec![]
    }

    fn chain_id(&self) -> ChainId {
        self.network.as_chain_id()
    }
}
