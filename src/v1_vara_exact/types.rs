//! Type definitions for the V1 Vara "exact" payment scheme.
//!
//! This module defines the request and response shapes of the facilitator
//! endpoints, the decoded payment payload, and the closed set of rejection
//! reasons every endpoint reports.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::VaraNetwork;
#[cfg(feature = "facilitator")]
use crate::chain::VaraProviderError;

/// The only x402 protocol version this facilitator speaks.
pub const X402_VERSION: u64 = 1;

/// Response header carrying the verify pipeline duration in milliseconds.
pub const VERIFICATION_TIME_HEADER: &str = "X-Verification-Time";

/// Response header carrying the settle pipeline duration in milliseconds.
pub const SETTLEMENT_TIME_HEADER: &str = "X-Settlement-Time";

/// Substrings in a chain error that mean the transaction was already used.
///
/// The chain reports replays only as free text, so matching is by substring.
/// Keep this list in sync with the gateway's error wording.
pub const DUPLICATE_SUBMISSION_MARKERS: [&str; 3] = [
    "SEQUENCE_NUMBER_TOO_OLD",
    "INVALID_SEQ_NUMBER",
    "already submitted",
];

/// Returns `true` if `message` reports a replayed or already-used transaction.
pub fn is_duplicate_submission(message: &str) -> bool {
    DUPLICATE_SUBMISSION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// String literal for the "exact" scheme name.
#[derive(Debug, Clone, Copy)]
pub struct ExactScheme;

impl AsRef<str> for ExactScheme {
    fn as_ref(&self) -> &str {
        "exact"
    }
}

impl std::fmt::Display for ExactScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exact")
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Server-declared terms a payment must satisfy.
///
/// Deserialization never fails on field types: string fields holding any
/// other JSON value keep that value's JSON text, and optional fields of the
/// wrong type are dropped. A partially filled or oddly typed object therefore
/// still reaches the validator and is rejected with a precise reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Token identifier, or `native` for VARA.
    pub asset: String,
    /// Decimal integer string in base units, compared without precision loss.
    pub max_amount_required: String,
    pub pay_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl From<Value> for PaymentRequirements {
    fn from(value: Value) -> Self {
        let text = |key: &str| value.get(key).map(json_text).unwrap_or_default();
        let optional_text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            scheme: text("scheme"),
            network: text("network"),
            asset: text("asset"),
            max_amount_required: text("maxAmountRequired"),
            pay_to: text("payTo"),
            resource: optional_text("resource"),
            description: optional_text("description"),
            mime_type: optional_text("mimeType"),
            max_timeout_seconds: value.get("maxTimeoutSeconds").and_then(Value::as_u64),
            extra: value.get("extra").filter(|extra| !extra.is_null()).cloned(),
        }
    }
}

/// Renders a JSON value the way it appears in a reason string: strings
/// without quotes, everything else as JSON text.
pub(crate) fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Body of `POST /verify` and `POST /settle`.
///
/// `x402Version` and `paymentHeader` stay untyped until their gates run, so
/// a wrongly typed value is reported by the gate that owns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest {
    #[serde(default)]
    pub x402_version: Option<Value>,
    /// Base64-encoded JSON [`PaymentPayload`], as sent in `X-PAYMENT`.
    #[serde(default)]
    pub payment_header: Option<Value>,
    #[serde(default)]
    pub payment_requirements: Option<PaymentRequirements>,
}

impl FacilitatorRequest {
    /// Parses a raw request body.
    ///
    /// Any JSON document is accepted; a body that is not a JSON object
    /// carries no fields and fails the version gate.
    ///
    /// # Errors
    ///
    /// Returns [`VaraExactError::MalformedBody`] if the body is not JSON.
    pub fn from_slice(body: &[u8]) -> Result<Self, VaraExactError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| VaraExactError::MalformedBody(e.to_string()))?;
        Ok(Self::from_value(value))
    }

    /// Splits a JSON document into the request fields.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        Self {
            x402_version: fields.remove("x402Version"),
            payment_header: fields.remove("paymentHeader"),
            payment_requirements: fields
                .remove("paymentRequirements")
                .filter(|requirements| !requirements.is_null())
                .map(PaymentRequirements::from),
        }
    }
}

// ============================================================================
// Payment payload
// ============================================================================

/// The client's proof of payment, decoded from the payment header.
///
/// Unknown fields are kept so the payload reaches the chain verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x402_version: Option<u64>,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub payload: VaraExactPayload,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentPayload {
    /// The payer's account, taken from the signed transaction.
    pub fn payer(&self) -> Option<&str> {
        self.payload
            .transaction
            .as_ref()
            .and_then(|tx| tx.address.as_deref())
            .filter(|address| !address.is_empty())
    }
}

/// The Vara-specific part of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaraExactPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<VaraTransaction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VaraExactPayload {
    /// Returns `true` when both a non-empty signature and a transaction are present.
    pub fn is_complete(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.is_empty()) && self.transaction.is_some()
    }
}

/// The signed transaction. Only `address` is read by the facilitator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaraTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

// ============================================================================
// Responses
// ============================================================================

/// A successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub tx_hash: String,
    pub network: VaraNetwork,
}

/// Wire shape of the verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    pub invalid_reason: Option<String>,
}

impl VerifyResponse {
    /// Encodes a verify outcome.
    pub fn encode(outcome: &Result<(), VaraExactError>) -> Self {
        match outcome {
            Ok(()) => Self {
                is_valid: true,
                invalid_reason: None,
            },
            Err(e) => Self {
                is_valid: false,
                invalid_reason: Some(e.to_string()),
            },
        }
    }
}

/// Wire shape of the settle endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    pub error: Option<String>,
    pub tx_hash: Option<String>,
    pub network_id: Option<String>,
}

impl SettleResponse {
    /// Encodes a settle outcome.
    pub fn encode(outcome: &Result<Settlement, VaraExactError>) -> Self {
        match outcome {
            Ok(settlement) => Self {
                success: true,
                error: None,
                tx_hash: Some(settlement.tx_hash.clone()),
                network_id: Some(settlement.network.to_string()),
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
                tx_hash: None,
                network_id: None,
            },
        }
    }
}

/// HTTP status for an outcome. Rejections are 200 unless the error says otherwise.
pub fn outcome_status<T>(outcome: &Result<T, VaraExactError>) -> StatusCode {
    outcome
        .as_ref()
        .err()
        .map_or(StatusCode::OK, VaraExactError::status_code)
}

/// A payment kind the facilitator accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    pub x402_version: u64,
    pub scheme: String,
    pub network: String,
}

/// Body of `GET /supported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedResponse {
    pub kinds: Vec<SupportedKind>,
}

// ============================================================================
// Errors
// ============================================================================

/// Failure to turn a payment header into a [`PaymentPayload`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentHeaderError {
    /// The header is not base64, or does not decode to UTF-8 text.
    #[error("Invalid base64 encoding in X-PAYMENT header")]
    InvalidBase64,
    /// The decoded text is not a JSON payment payload.
    #[error("Invalid JSON in payment payload")]
    InvalidJson,
}

/// Every way a verify or settle request can end other than success.
///
/// The `Display` output is the exact reason string placed in the response.
#[derive(Debug, thiserror::Error)]
pub enum VaraExactError {
    #[error("Unsupported x402 version: {0}")]
    UnsupportedVersion(String),

    #[error("Missing paymentHeader or paymentRequirements")]
    MissingFields,

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid Vara network: {network}. Expected one of {expected}")]
    InvalidNetwork { network: String, expected: String },

    #[error(transparent)]
    PaymentHeader(#[from] PaymentHeaderError),

    #[error("Scheme mismatch: expected {expected}, got {got}")]
    SchemeMismatch { expected: String, got: String },

    #[error("Network mismatch: expected {expected}, got {got}")]
    NetworkMismatch { expected: String, got: String },

    #[error("Asset mismatch: expected {expected}, got {got}")]
    AssetMismatch { expected: String, got: String },

    #[error("Invalid maxAmountRequired: {0}")]
    InvalidAmount(String),

    #[error("Insufficient asset balance: expected {expected}, got {got}")]
    InsufficientBalance { expected: String, got: String },

    #[error("Invalid payload: missing signature or transaction")]
    IncompletePayload,

    /// The chain refused the payment; the chain's reason is passed through.
    #[error("{0}")]
    Rejected(String),

    /// The transaction was already submitted or finalized.
    #[error("Transaction already used")]
    AlreadyUsed,

    /// The chain could not be reached or answered nonsense.
    #[cfg(feature = "facilitator")]
    #[error("{0}")]
    Provider(#[from] VaraProviderError),
}

impl VaraExactError {
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VaraExactError::MissingFields | VaraExactError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            VaraExactError::AlreadyUsed => StatusCode::CONFLICT,
            #[cfg(feature = "facilitator")]
            VaraExactError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_scheme_display() {
        assert_eq!(ExactScheme.to_string(), "exact");
        assert_eq!(ExactScheme.as_ref(), "exact");
    }

    #[test]
    fn test_duplicate_markers() {
        assert!(is_duplicate_submission("Extrinsic failed: INVALID_SEQ_NUMBER"));
        assert!(is_duplicate_submission("SEQUENCE_NUMBER_TOO_OLD"));
        assert!(is_duplicate_submission("tx already submitted to pool"));
        assert!(!is_duplicate_submission("Already Submitted"));
        assert!(!is_duplicate_submission("insufficient funds"));
    }

    #[test]
    fn test_requirements_wire_names() {
        let json = r#"{
            "scheme": "exact",
            "network": "vara-testnet",
            "asset": "native",
            "maxAmountRequired": "1000000000000",
            "payTo": "kGkLEU3e3XXkJp2WK4eNpVmSab5xUNL9QtmLPh8QfCL2EgotW",
            "maxTimeoutSeconds": 60
        }"#;
        let requirements: PaymentRequirements = serde_json::from_str(json).unwrap();
        assert_eq!(requirements.max_amount_required, "1000000000000");
        assert_eq!(requirements.max_timeout_seconds, Some(60));
        assert!(requirements.resource.is_none());
    }

    #[test]
    fn test_requirements_tolerate_wrong_types() {
        let value = serde_json::json!({
            "scheme": 1,
            "network": null,
            "maxAmountRequired": 1000,
            "payTo": "kGkL",
            "resource": 7,
            "maxTimeoutSeconds": "60",
            "extra": null
        });
        let requirements: PaymentRequirements = serde_json::from_value(value).unwrap();
        assert_eq!(requirements.scheme, "1");
        assert_eq!(requirements.network, "null");
        assert_eq!(requirements.asset, "");
        assert_eq!(requirements.max_amount_required, "1000");
        assert!(requirements.resource.is_none());
        assert!(requirements.max_timeout_seconds.is_none());
        assert!(requirements.extra.is_none());
    }

    #[test]
    fn test_request_body_parsing() {
        let request = FacilitatorRequest::from_slice(
            br#"{"x402Version":"2","paymentHeader":false,"paymentRequirements":null}"#,
        )
        .unwrap();
        assert_eq!(request.x402_version, Some(Value::from("2")));
        assert_eq!(request.payment_header, Some(Value::Bool(false)));
        assert!(request.payment_requirements.is_none());

        assert_eq!(
            FacilitatorRequest::from_slice(b"[1]").unwrap(),
            FacilitatorRequest::default()
        );
        assert!(matches!(
            FacilitatorRequest::from_slice(b"{\"x402Version\":"),
            Err(VaraExactError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_payload_keeps_unknown_fields() {
        let json = r#"{
            "x402Version": 1,
            "scheme": "exact",
            "network": "vara",
            "asset": "native",
            "payload": {
                "signature": "0xsig",
                "transaction": {"address": "5Grw", "value": "10", "nonce": 3},
                "validUntil": 99
            }
        }"#;
        let payload: PaymentPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.payer(), Some("5Grw"));
        assert!(payload.payload.is_complete());
        let tx = payload.payload.transaction.as_ref().unwrap();
        assert_eq!(tx.rest["nonce"], 3);

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["payload"]["validUntil"], 99);
        assert_eq!(value["payload"]["transaction"]["value"], "10");
    }

    #[test]
    fn test_incomplete_payload() {
        let missing_sig: VaraExactPayload =
            serde_json::from_str(r#"{"transaction":{"address":"5Grw"}}"#).unwrap();
        assert!(!missing_sig.is_complete());
        let empty_sig: VaraExactPayload =
            serde_json::from_str(r#"{"signature":"","transaction":{}}"#).unwrap();
        assert!(!empty_sig.is_complete());
        let null_tx: VaraExactPayload =
            serde_json::from_str(r#"{"signature":"0x01","transaction":null}"#).unwrap();
        assert!(!null_tx.is_complete());
    }

    #[test]
    fn test_verify_response_shapes() {
        let ok = serde_json::to_value(VerifyResponse::encode(&Ok(()))).unwrap();
        assert_eq!(ok, serde_json::json!({"isValid": true, "invalidReason": null}));

        let rejected = VerifyResponse::encode(&Err(VaraExactError::IncompletePayload));
        let value = serde_json::to_value(rejected).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "isValid": false,
                "invalidReason": "Invalid payload: missing signature or transaction"
            })
        );
    }

    #[test]
    fn test_settle_response_shapes() {
        let settled = SettleResponse::encode(&Ok(Settlement {
            tx_hash: "0xabc".to_string(),
            network: VaraNetwork::Testnet,
        }));
        assert_eq!(
            serde_json::to_value(settled).unwrap(),
            serde_json::json!({
                "success": true,
                "error": null,
                "txHash": "0xabc",
                "networkId": "vara-testnet"
            })
        );

        let used = SettleResponse::encode(&Err(VaraExactError::AlreadyUsed));
        assert_eq!(
            serde_json::to_value(used).unwrap(),
            serde_json::json!({
                "success": false,
                "error": "Transaction already used",
                "txHash": null,
                "networkId": null
            })
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(outcome_status(&Ok::<(), VaraExactError>(())), StatusCode::OK);
        assert_eq!(
            outcome_status::<()>(&Err(VaraExactError::MissingFields)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            outcome_status::<()>(&Err(VaraExactError::AlreadyUsed)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            outcome_status::<()>(&Err(VaraExactError::UnsupportedScheme("upto".into()))),
            StatusCode::OK
        );
    }

    #[test]
    fn test_error_messages() {
        let err = VaraExactError::InvalidNetwork {
            network: "ethereum".to_string(),
            expected: VaraNetwork::valid_networks(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid Vara network: ethereum. Expected one of vara, vara-testnet"
        );
        let err: VaraExactError = PaymentHeaderError::InvalidBase64.into();
        assert_eq!(err.to_string(), "Invalid base64 encoding in X-PAYMENT header");
    }
}
