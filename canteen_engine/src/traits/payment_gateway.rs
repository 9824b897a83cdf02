use canteen_common::Money;
use thiserror::Error;

use crate::db_types::PaymentIntent;

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Cannot create a payment intent for {0}. Amounts must be positive")]
    InvalidAmount(Money),
    #[error("The payment gateway is unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("The payment gateway has no record of intent {0}")]
    IntentNotFound(String),
}

/// The external payment provider.
///
/// Signature checks are pure functions of the configured secrets and their inputs; they never touch the network.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Opens a gateway-side order for `amount`. Non-positive amounts fail with `InvalidAmount` without contacting
    /// the provider.
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentGatewayError>;

    /// Looks up an intent the gateway issued earlier. The returned amount is what the customer was actually charged.
    async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentGatewayError>;

    /// Checks the signature the checkout widget hands back after a successful payment.
    fn verify_signature(&self, intent_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Checks a webhook signature over the exact bytes received.
    fn verify_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool;
}
