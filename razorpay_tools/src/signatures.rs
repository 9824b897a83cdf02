//! HMAC-SHA256 signatures used by the gateway.
//!
//! * Checkout signatures are computed over `"{gateway_order_id}|{payment_id}"` with the API key secret.
//! * Webhook signatures are computed over the raw request body, byte for byte, with the webhook secret.
//!
//! Signatures are lowercase hex. Comparisons run in constant time.
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The header that carries the webhook signature.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Returns the lowercase hex HMAC-SHA256 of `data` keyed with `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(e) => {
            error!("💳️ Could not initialise HMAC: {e}");
            return String::new();
        },
    };
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

pub fn payment_signature_message(gateway_order_id: &str, payment_id: &str) -> String {
    format!("{gateway_order_id}|{payment_id}")
}

pub fn verify_payment_signature(secret: &str, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
    let message = payment_signature_message(gateway_order_id, payment_id);
    let expected = calculate_hmac(secret, message.as_bytes());
    constant_time_eq_hex(&expected, signature)
}

pub fn verify_webhook_signature(secret: &str, raw_body: &[u8], signature: &str) -> bool {
    let expected = calculate_hmac(secret, raw_body);
    constant_time_eq_hex(&expected, signature)
}

/// Compares two hex strings without short-circuiting on the first differing byte. Case-insensitive.
pub fn constant_time_eq_hex(expected: &str, provided: &str) -> bool {
    let provided = provided.trim();
    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }
    expected
        .bytes()
        .zip(provided.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a.to_ascii_lowercase() ^ b.to_ascii_lowercase()))
        == 0
}
