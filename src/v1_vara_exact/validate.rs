//! Validation gates for verify and settle requests.
//!
//! Each gate either passes or returns the single [`VaraExactError`] that
//! ends the request. Callers apply the gates in a fixed order so the same
//! bad request always produces the same reason:
//!
//! 1. [`check_version`]
//! 2. [`require_fields`]
//! 3. [`check_requirements`] (scheme, then network)
//! 4. [`check_payload_matches`] (scheme, network, and on verify, asset)
//! 5. [`check_balance`] then [`check_payload_complete`] (verify only)

use std::str::FromStr;

use num_bigint::BigUint;
use serde_json::Value;

use super::types::{
    ExactScheme, FacilitatorRequest, PaymentHeaderError, PaymentPayload, PaymentRequirements,
    VaraExactError, X402_VERSION, json_text,
};
use crate::chain::VaraNetwork;

/// Which payload fields must equal the requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// Scheme and network. Used by settle.
    SchemeAndNetwork,
    /// Scheme, network, and asset. Used by verify.
    WithAsset,
}

/// Rejects any protocol version other than [`X402_VERSION`].
///
/// Any JSON number equal to the version passes, so `1.0` is accepted.
/// Strings never pass, even `"1"`.
pub fn check_version(version: Option<&Value>) -> Result<(), VaraExactError> {
    match version {
        Some(v) if v.as_f64() == Some(X402_VERSION as f64) => Ok(()),
        Some(v) => Err(VaraExactError::UnsupportedVersion(json_text(v))),
        None => Err(VaraExactError::UnsupportedVersion("none".to_string())),
    }
}

/// Returns the payment header and requirements, or [`VaraExactError::MissingFields`].
///
/// A header that is `null`, `false`, `0` or the empty string counts as missing.
/// Any other value is returned as is; [`header_text`] checks its type.
pub fn require_fields(
    request: &FacilitatorRequest,
) -> Result<(&Value, &PaymentRequirements), VaraExactError> {
    match (&request.payment_header, &request.payment_requirements) {
        (Some(header), Some(requirements)) if !is_blank(header) => Ok((header, requirements)),
        _ => Err(VaraExactError::MissingFields),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// The header as text. A header of any other JSON type cannot be base64.
pub fn header_text(header: &Value) -> Result<&str, VaraExactError> {
    header
        .as_str()
        .ok_or(VaraExactError::PaymentHeader(PaymentHeaderError::InvalidBase64))
}

/// Checks the requirements name the exact scheme and a Vara network.
pub fn check_requirements(
    requirements: &PaymentRequirements,
) -> Result<VaraNetwork, VaraExactError> {
    if requirements.scheme != ExactScheme.as_ref() {
        return Err(VaraExactError::UnsupportedScheme(
            requirements.scheme.clone(),
        ));
    }
    VaraNetwork::from_str(&requirements.network).map_err(|_| VaraExactError::InvalidNetwork {
        network: requirements.network.clone(),
        expected: VaraNetwork::valid_networks(),
    })
}

/// Checks the client paid under the terms the server asked for.
///
/// Comparison is exact: no case folding or trimming.
pub fn check_payload_matches(
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    scope: MatchScope,
) -> Result<(), VaraExactError> {
    if payload.scheme != requirements.scheme {
        return Err(VaraExactError::SchemeMismatch {
            expected: requirements.scheme.clone(),
            got: payload.scheme.clone(),
        });
    }
    if payload.network != requirements.network {
        return Err(VaraExactError::NetworkMismatch {
            expected: requirements.network.clone(),
            got: payload.network.clone(),
        });
    }
    if scope == MatchScope::WithAsset && payload.asset != requirements.asset {
        return Err(VaraExactError::AssetMismatch {
            expected: requirements.asset.clone(),
            got: payload.asset.clone(),
        });
    }
    Ok(())
}

/// Parses `maxAmountRequired` as an unbounded non-negative integer.
pub fn required_amount(requirements: &PaymentRequirements) -> Result<BigUint, VaraExactError> {
    let raw = requirements.max_amount_required.as_str();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VaraExactError::InvalidAmount(raw.to_string()));
    }
    BigUint::from_str(raw).map_err(|_| VaraExactError::InvalidAmount(raw.to_string()))
}

/// Rejects a payer whose balance is below the required amount.
pub fn check_balance(required: &BigUint, balance: &BigUint) -> Result<(), VaraExactError> {
    if balance < required {
        return Err(VaraExactError::InsufficientBalance {
            expected: required.to_string(),
            got: balance.to_string(),
        });
    }
    Ok(())
}

/// Rejects a payload without both a signature and a transaction.
pub fn check_payload_complete(payload: &PaymentPayload) -> Result<(), VaraExactError> {
    if payload.payload.is_complete() {
        Ok(())
    } else {
        Err(VaraExactError::IncompletePayload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_string(),
            network: "vara-testnet".to_string(),
            asset: "native".to_string(),
            max_amount_required: "1000000000000".to_string(),
            pay_to: "kGkLEU3e3XXkJp2WK4eNpVmSab5xUNL9QtmLPh8QfCL2EgotW".to_string(),
            ..Default::default()
        }
    }

    fn payload() -> PaymentPayload {
        PaymentPayload {
            x402_version: Some(1),
            scheme: "exact".to_string(),
            network: "vara-testnet".to_string(),
            asset: "native".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_version_gate() {
        assert!(check_version(Some(&json!(1))).is_ok());
        assert!(check_version(Some(&json!(1.0))).is_ok());
        let err = check_version(Some(&json!(2))).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported x402 version: 2");
        let err = check_version(None).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported x402 version: none");
        assert!(check_version(Some(&json!(1.5))).is_err());
    }

    #[test]
    fn test_version_gate_rejects_non_numbers() {
        let err = check_version(Some(&json!("2"))).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported x402 version: 2");
        assert!(check_version(Some(&json!("1"))).is_err());
        let err = check_version(Some(&Value::Null)).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported x402 version: null");
    }

    #[test]
    fn test_required_fields() {
        let mut request = FacilitatorRequest {
            x402_version: Some(json!(1)),
            payment_header: Some(json!("abc")),
            payment_requirements: Some(requirements()),
        };
        assert!(require_fields(&request).is_ok());

        for blank in [json!(""), json!(null), json!(false), json!(0)] {
            request.payment_header = Some(blank);
            assert!(matches!(
                require_fields(&request),
                Err(VaraExactError::MissingFields)
            ));
        }

        request.payment_header = Some(json!(42));
        let (header, _) = require_fields(&request).unwrap();
        assert_eq!(
            header_text(header).unwrap_err().to_string(),
            "Invalid base64 encoding in X-PAYMENT header"
        );

        request.payment_header = Some(json!("abc"));
        request.payment_requirements = None;
        assert!(matches!(
            require_fields(&request),
            Err(VaraExactError::MissingFields)
        ));
    }

    #[test]
    fn test_scheme_checked_before_network() {
        let mut req = requirements();
        req.scheme = "upto".to_string();
        req.network = "ethereum".to_string();
        let err = check_requirements(&req).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported scheme: upto");
    }

    #[test]
    fn test_non_string_network_fails_network_gate() {
        let req = PaymentRequirements::from(json!({"scheme": "exact", "network": null}));
        let err = check_requirements(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Vara network: null. Expected one of vara, vara-testnet"
        );

        let req = PaymentRequirements::from(json!({"scheme": 1, "network": "vara"}));
        let err = check_requirements(&req).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported scheme: 1");
    }

    #[test]
    fn test_network_gate() {
        assert_eq!(check_requirements(&requirements()).unwrap(), VaraNetwork::Testnet);

        let mut req = requirements();
        req.network = String::new();
        let err = check_requirements(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Vara network: . Expected one of vara, vara-testnet"
        );
    }

    #[test]
    fn test_mismatch_order() {
        let req = requirements();
        let mut p = payload();
        p.scheme = "upto".to_string();
        p.network = "vara".to_string();
        let err = check_payload_matches(&p, &req, MatchScope::WithAsset).unwrap_err();
        assert_eq!(err.to_string(), "Scheme mismatch: expected exact, got upto");

        let mut p = payload();
        p.network = "vara".to_string();
        let err = check_payload_matches(&p, &req, MatchScope::WithAsset).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Network mismatch: expected vara-testnet, got vara"
        );
    }

    #[test]
    fn test_asset_only_checked_with_asset_scope() {
        let req = requirements();
        let mut p = payload();
        p.asset = "0xtoken".to_string();
        assert!(check_payload_matches(&p, &req, MatchScope::SchemeAndNetwork).is_ok());
        let err = check_payload_matches(&p, &req, MatchScope::WithAsset).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Asset mismatch: expected native, got 0xtoken"
        );
    }

    #[test]
    fn test_no_coercion() {
        let req = requirements();
        let mut p = payload();
        p.network = "VARA-TESTNET".to_string();
        assert!(check_payload_matches(&p, &req, MatchScope::SchemeAndNetwork).is_err());
    }

    #[test]
    fn test_balance_gate_large_amounts() {
        let mut req = requirements();
        req.max_amount_required = "1000000000000000000000000000000000000000".to_string();
        let required = required_amount(&req).unwrap();
        let balance = BigUint::from_str("999999999999999999999999999999999999999").unwrap();
        let err = check_balance(&required, &balance).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient asset balance: expected 1000000000000000000000000000000000000000, got 999999999999999999999999999999999999999"
        );
        assert!(check_balance(&required, &required).is_ok());
    }

    #[test]
    fn test_invalid_amount() {
        for bad in ["", "-5", "1.5", "1e12", " 10"] {
            let mut req = requirements();
            req.max_amount_required = bad.to_string();
            assert!(matches!(
                required_amount(&req),
                Err(VaraExactError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn test_payload_complete_gate() {
        let err = check_payload_complete(&payload()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid payload: missing signature or transaction"
        );
    }
}
