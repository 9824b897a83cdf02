use canteen_common::{Secret, CURRENCY_CODE};
use log::*;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone, Default)]
pub struct RazorpayConfig {
    pub api_url: String,
    pub key_id: String,
    /// Used for basic auth against the REST API and as the HMAC key for checkout signatures.
    pub key_secret: Secret<String>,
    /// HMAC key for webhook deliveries.
    pub webhook_secret: Secret<String>,
    pub currency: String,
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("CANTEEN_RAZORPAY_API_URL").unwrap_or_else(|_| {
            debug!("💳️ CANTEEN_RAZORPAY_API_URL not set, using {DEFAULT_RAZORPAY_API_URL}");
            DEFAULT_RAZORPAY_API_URL.to_string()
        });
        let key_id = std::env::var("CANTEEN_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("💳️ CANTEEN_RAZORPAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_00000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("CANTEEN_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("💳️ CANTEEN_RAZORPAY_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let webhook_secret = match std::env::var("CANTEEN_RAZORPAY_WEBHOOK_SECRET") {
            Ok(s) if !s.trim().is_empty() => Secret::new(s),
            _ => {
                info!("💳️ CANTEEN_RAZORPAY_WEBHOOK_SECRET not set. Webhooks will be verified with the API key secret");
                key_secret.clone()
            },
        };
        let currency = std::env::var("CANTEEN_CURRENCY").unwrap_or_else(|_| CURRENCY_CODE.to_string());
        Self { api_url, key_id, key_secret, webhook_secret, currency }
    }
}
