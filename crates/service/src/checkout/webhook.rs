//! Webhook payload types and signature check.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";
pub const CHARGE_SUCCESS: &str = "charge.success";

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub reference: Option<String>,
    /// Minor units.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Compare `signature` against hex(HMAC-SHA512(secret, body)) in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Hex signature for `body`; used by tests and local tooling.
pub fn sign(secret: &str, body: &[u8]) -> String {
    match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(body);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

/// Whether the webhook amount (minor units) matches the stored amount.
pub fn amount_matches(stored: Decimal, reported_minor: Option<i64>) -> bool {
    match (models::payment_intent::to_minor_units(stored), reported_minor) {
        (Some(a), Some(b)) => a == b,
        (_, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip_and_tamper() {
        let body = br#"{"event":"charge.success","data":{"reference":"AS-1"}}"#;
        let sig = sign("whsec", body);
        assert_eq!(sig.len(), 128);
        assert!(verify_signature("whsec", body, &sig));
        assert!(verify_signature("whsec", body, &sig.to_uppercase()));
        assert!(!verify_signature("other", body, &sig));
        assert!(!verify_signature("whsec", b"{}", &sig));
        assert!(!verify_signature("whsec", body, "not-hex"));
    }

    #[test]
    fn event_parses_with_missing_fields() {
        let e: WebhookEvent = serde_json::from_str(r#"{"event":"transfer.success"}"#).unwrap();
        assert_eq!(e.event, "transfer.success");
        assert!(e.data.reference.is_none());
    }

    #[test]
    fn amount_check_uses_minor_units() {
        let stored = Decimal::new(150_000, 2);
        assert!(amount_matches(stored, Some(150_000)));
        assert!(!amount_matches(stored, Some(1_500)));
        assert!(amount_matches(stored, None));
    }
}
