//! Facilitator-side payment verification and settlement for V1 Vara exact scheme.
//!
//! Both endpoints run the same linear pipeline and stop at the first gate
//! that fails:
//!
//! 1. **Validate**: protocol version, required fields, scheme, network
//! 2. **Decode**: base64 and JSON decoding of the payment header
//! 3. **Match**: payload scheme, network (and asset on verify) against the
//!    requirements
//! 4. **Verify only**: payer balance against `maxAmountRequired`, presence of
//!    signature and transaction, then the chain's signature verification
//! 5. **Settle only**: submission through the chain, without waiting for
//!    finality
//!
//! No chain handle is acquired until every local gate has passed.

use std::sync::Arc;

use crate::chain::{ChainApiSource, SettleOptions, VaraAsset, VaraNetwork, VaraProviderError};
use crate::v1_vara_exact::decode::decode_payment_header;
use crate::v1_vara_exact::types::{
    ExactScheme, FacilitatorRequest, PaymentPayload, PaymentRequirements, Settlement,
    SupportedKind, SupportedResponse, VaraExactError, X402_VERSION, is_duplicate_submission,
};
use crate::v1_vara_exact::validate::{self, MatchScope};

/// Reason reported when the chain rejects a signature without saying why.
const DEFAULT_INVALID_REASON: &str = "Invalid signature";

/// Reason reported when the chain rejects a submission without saying why.
const DEFAULT_SETTLE_ERROR: &str = "Settlement failed";

/// A request that passed every local gate.
struct Prepared<'a> {
    network: VaraNetwork,
    requirements: &'a PaymentRequirements,
    payload: PaymentPayload,
}

/// Facilitator for V1 Vara exact scheme payments.
///
/// Stateless apart from the chain source; one instance serves every request.
pub struct V1VaraExactFacilitator {
    source: Arc<dyn ChainApiSource>,
}

impl V1VaraExactFacilitator {
    /// Creates a facilitator acquiring chain handles from `source`.
    pub fn new(source: Arc<dyn ChainApiSource>) -> Self {
        Self { source }
    }

    /// Payment kinds accepted, one per network the source can serve.
    pub fn supported(&self) -> SupportedResponse {
        let kinds = self
            .source
            .networks()
            .into_iter()
            .map(|network| SupportedKind {
                x402_version: X402_VERSION,
                scheme: ExactScheme.to_string(),
                network: network.to_string(),
            })
            .collect();
        SupportedResponse { kinds }
    }

    /// Verifies a payment without moving funds.
    ///
    /// # Errors
    ///
    /// Returns the first gate's rejection, the chain's reason for an invalid
    /// signature, or [`VaraExactError::Provider`] if the chain is unreachable.
    pub async fn verify(&self, request: &FacilitatorRequest) -> Result<(), VaraExactError> {
        let Prepared {
            network,
            requirements,
            payload,
        } = prepare(request)?;

        validate::check_payload_matches(&payload, requirements, MatchScope::WithAsset)?;
        let required = validate::required_amount(requirements)?;

        let api = self.source.acquire(network).await?;

        // Without a payer there is no balance to read; the completeness
        // gate below reports the missing transaction.
        if let Some(payer) = payload.payer() {
            let asset = VaraAsset::from(requirements.asset.as_str());
            let balance = api.balance_of(payer, &asset).await?;
            validate::check_balance(&required, &balance)?;
        }
        validate::check_payload_complete(&payload)?;

        // TODO: check payTo and the transferred amount inside the transaction
        // once the gateway exposes the decoded call; the signature check
        // below is the only binding to the requirements today.
        let verification = api.verify(&payload).await?;
        if !verification.is_valid {
            let reason = verification
                .invalid_reason
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| DEFAULT_INVALID_REASON.to_string());
            return Err(VaraExactError::Rejected(reason));
        }

        tracing::debug!(
            network = %network,
            payer = payload.payer().unwrap_or_default(),
            "Payment verified"
        );
        Ok(())
    }

    /// Submits a payment to the chain and reports as soon as it is accepted.
    ///
    /// # Errors
    ///
    /// Returns the first gate's rejection, [`VaraExactError::AlreadyUsed`] when
    /// the chain reports a replay, the chain's reason for any other refusal,
    /// or [`VaraExactError::Provider`] if the chain is unreachable.
    pub async fn settle(&self, request: &FacilitatorRequest) -> Result<Settlement, VaraExactError> {
        let Prepared {
            network,
            requirements,
            payload,
        } = prepare(request)?;

        validate::check_payload_matches(&payload, requirements, MatchScope::SchemeAndNetwork)?;

        let api = self.source.acquire(network).await?;
        let submission = api
            .settle(&payload, SettleOptions::SUBMITTED)
            .await
            .map_err(settle_fault)?;

        if !submission.success {
            let message = submission
                .message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| DEFAULT_SETTLE_ERROR.to_string());
            if is_duplicate_submission(&message) {
                return Err(VaraExactError::AlreadyUsed);
            }
            return Err(VaraExactError::Rejected(message));
        }

        let tx_hash = submission.tx_hash.filter(|hash| !hash.is_empty()).ok_or_else(|| {
            VaraProviderError::MalformedResponse(
                "settlement reported success without a transaction hash".to_string(),
            )
        })?;

        Ok(Settlement {
            tx_hash,
            network: api.network(),
        })
    }
}

/// Runs the gates shared by verify and settle, then decodes the header.
fn prepare(request: &FacilitatorRequest) -> Result<Prepared<'_>, VaraExactError> {
    validate::check_version(request.x402_version.as_ref())?;
    let (header, requirements) = validate::require_fields(request)?;
    let network = validate::check_requirements(requirements)?;
    let payload = decode_payment_header(validate::header_text(header)?)?;
    Ok(Prepared {
        network,
        requirements,
        payload,
    })
}

/// Chain faults during settlement may still be replays.
fn settle_fault(error: VaraProviderError) -> VaraExactError {
    if is_duplicate_submission(&error.to_string()) {
        VaraExactError::AlreadyUsed
    } else {
        VaraExactError::Provider(error)
    }
}
