//! Payment header decoding.
//!
//! The `X-PAYMENT` header carries a base64-encoded JSON [`PaymentPayload`].
//! Decoding is pure: the same header always yields the same payload or the
//! same error.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::types::{PaymentHeaderError, PaymentPayload};

/// Standard alphabet, with or without trailing `=` padding.
const HEADER_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a payment header into a [`PaymentPayload`].
///
/// Only JSON well-formedness is checked here; field values are validated
/// against the payment requirements later.
///
/// # Errors
///
/// - [`PaymentHeaderError::InvalidBase64`] if the header is not base64 or the
///   bytes are not UTF-8
/// - [`PaymentHeaderError::InvalidJson`] if the text is not a payment payload
///   object
pub fn decode_payment_header(header: &str) -> Result<PaymentPayload, PaymentHeaderError> {
    let bytes = HEADER_ENGINE
        .decode(header.trim())
        .map_err(|_| PaymentHeaderError::InvalidBase64)?;
    let text = String::from_utf8(bytes).map_err(|_| PaymentHeaderError::InvalidBase64)?;
    serde_json::from_str(&text).map_err(|_| PaymentHeaderError::InvalidJson)
}

/// Encodes a payload the way clients place it in the `X-PAYMENT` header.
pub fn encode_payment_header(payload: &PaymentPayload) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(payload)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

    const PAYLOAD_JSON: &str = r#"{"x402Version":1,"scheme":"exact","network":"vara-testnet","asset":"native","payload":{"signature":"0x01","transaction":{"address":"5Grw"}}}"#;

    #[test]
    fn test_decode_padded_and_unpadded() {
        let padded = STANDARD.encode(PAYLOAD_JSON);
        let unpadded = STANDARD_NO_PAD.encode(PAYLOAD_JSON);
        let a = decode_payment_header(&padded).unwrap();
        let b = decode_payment_header(&unpadded).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.network, "vara-testnet");
        assert_eq!(a.payer(), Some("5Grw"));
    }

    #[test]
    fn test_decode_is_repeatable() {
        let header = STANDARD.encode(PAYLOAD_JSON);
        assert_eq!(
            decode_payment_header(&header).unwrap(),
            decode_payment_header(&header).unwrap()
        );
    }

    #[test]
    fn test_invalid_base64() {
        assert_eq!(
            decode_payment_header("not base64!!"),
            Err(PaymentHeaderError::InvalidBase64)
        );
        assert_eq!(
            decode_payment_header("%%%%"),
            Err(PaymentHeaderError::InvalidBase64)
        );
    }

    #[test]
    fn test_non_utf8_is_base64_failure() {
        let header = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(
            decode_payment_header(&header),
            Err(PaymentHeaderError::InvalidBase64)
        );
    }

    #[test]
    fn test_invalid_json() {
        let header = STANDARD.encode("{not json");
        assert_eq!(
            decode_payment_header(&header),
            Err(PaymentHeaderError::InvalidJson)
        );
        let header = STANDARD.encode("42");
        assert_eq!(
            decode_payment_header(&header),
            Err(PaymentHeaderError::InvalidJson)
        );
    }

    #[test]
    fn test_encode_then_decode() {
        let payload = decode_payment_header(&STANDARD.encode(PAYLOAD_JSON)).unwrap();
        let header = encode_payment_header(&payload).unwrap();
        assert_eq!(decode_payment_header(&header).unwrap(), payload);
    }
}
