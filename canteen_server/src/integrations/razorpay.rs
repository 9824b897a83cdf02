//! Payment gateway backed by Razorpay.
use canteen_engine::{
    db_types::{Money, PaymentIntent},
    traits::{PaymentGateway, PaymentGatewayError},
};
use log::*;
use razorpay_tools::{
    signatures::{verify_payment_signature, verify_webhook_signature},
    RazorpayApi,
    RazorpayApiError,
    RazorpayConfig,
};

#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        if !config.key_secret.is_set() {
            warn!("💳️ The Razorpay key secret is empty. Every payment signature will be rejected.");
        }
        let api = RazorpayApi::new(config)?;
        Ok(Self { api })
    }

    pub fn config(&self) -> &RazorpayConfig {
        self.api.config()
    }
}

impl PaymentGateway for RazorpayGateway {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentGatewayError> {
        if !amount.is_positive() {
            return Err(PaymentGatewayError::InvalidAmount(amount));
        }
        let order = self.api.create_order(amount.value()).await.map_err(|e| match e {
            RazorpayApiError::InvalidAmount(_) => PaymentGatewayError::InvalidAmount(amount),
            e => {
                warn!("💳️ Could not create a gateway order for {amount}. {e}");
                PaymentGatewayError::GatewayUnavailable(e.to_string())
            },
        })?;
        Ok(PaymentIntent { id: order.id, amount: order.amount, currency: order.currency })
    }

    async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentGatewayError> {
        let order = self.api.fetch_order(intent_id).await.map_err(|e| match e {
            RazorpayApiError::QueryError { status: 400 | 404, .. } => {
                PaymentGatewayError::IntentNotFound(intent_id.to_string())
            },
            e => {
                warn!("💳️ Could not fetch gateway order {intent_id}. {e}");
                PaymentGatewayError::GatewayUnavailable(e.to_string())
            },
        })?;
        Ok(PaymentIntent { id: order.id, amount: order.amount, currency: order.currency })
    }

    fn verify_signature(&self, intent_id: &str, payment_id: &str, signature: &str) -> bool {
        let secret = self.config().key_secret.reveal();
        secret_is_usable(secret) && verify_payment_signature(secret, intent_id, payment_id, signature)
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool {
        let secret = self.config().webhook_secret.reveal();
        secret_is_usable(secret) && verify_webhook_signature(secret, raw_body, signature)
    }
}

// An empty key would let anyone compute valid signatures.
fn secret_is_usable(secret: &str) -> bool {
    !secret.trim().is_empty()
}
