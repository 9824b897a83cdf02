use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use canteen_common::{Money, CURRENCY_CODE};
use razorpay_tools::signatures::{
    calculate_hmac,
    payment_signature_message,
    verify_payment_signature,
    verify_webhook_signature,
};

use crate::{
    db_types::PaymentIntent,
    traits::{PaymentGateway, PaymentGatewayError},
};

pub const TEST_KEY_SECRET: &str = "canteen_test_key_secret";
pub const TEST_WEBHOOK_SECRET: &str = "canteen_test_webhook_secret";

/// An in-process gateway that signs like the real one. Intent ids are `order_test_<n>`. Only intents it created can be
/// fetched back.
#[derive(Clone, Default)]
pub struct TestGateway {
    counter: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
    intents_created: Arc<AtomicU64>,
    intents: Arc<Mutex<HashMap<String, PaymentIntent>>>,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `create_intent` calls fail as if the provider were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn intents_created(&self) -> u64 {
        self.intents_created.load(Ordering::SeqCst)
    }

    /// The signature the checkout widget would return for this payment.
    pub fn sign_payment(intent_id: &str, payment_id: &str) -> String {
        calculate_hmac(TEST_KEY_SECRET, payment_signature_message(intent_id, payment_id).as_bytes())
    }

    /// The `X-Razorpay-Signature` header value for this body.
    pub fn sign_webhook(body: &[u8]) -> String {
        calculate_hmac(TEST_WEBHOOK_SECRET, body)
    }
}

impl PaymentGateway for TestGateway {
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, PaymentGatewayError> {
        if !amount.is_positive() {
            return Err(PaymentGatewayError::InvalidAmount(amount));
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(PaymentGatewayError::GatewayUnavailable("connection refused".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.intents_created.fetch_add(1, Ordering::SeqCst);
        let id = format!("order_test_{n}");
        let intent = PaymentIntent { id, amount: amount.value(), currency: CURRENCY_CODE.to_string() };
        if let Ok(mut intents) = self.intents.lock() {
            intents.insert(intent.id.clone(), intent.clone());
        }
        Ok(intent)
    }

    async fn fetch_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentGatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PaymentGatewayError::GatewayUnavailable("connection refused".to_string()));
        }
        self.intents
            .lock()
            .ok()
            .and_then(|intents| intents.get(intent_id).cloned())
            .ok_or_else(|| PaymentGatewayError::IntentNotFound(intent_id.to_string()))
    }

    fn verify_signature(&self, intent_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(TEST_KEY_SECRET, intent_id, payment_id, signature)
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool {
        verify_webhook_signature(TEST_WEBHOOK_SECRET, raw_body, signature)
    }
}
