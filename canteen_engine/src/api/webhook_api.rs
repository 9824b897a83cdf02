use log::*;
use razorpay_tools::{WebhookEvent, WebhookEventType};

use crate::{
    db_types::{OrderNumber, PaymentStatus},
    events::{EventProducers, PaymentStatusChangedEvent},
    traits::{OrderManagement, OrderStoreError, PaymentGateway},
    WebhookError,
};

/// What happened to an authenticated webhook delivery. Every variant is acknowledged to the gateway; only a bad
/// signature is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event type is not one we act on.
    Ignored(String),
    /// The body was signed correctly but could not be understood.
    Malformed(String),
    /// The payment carries no gateway order id.
    MissingOrderId,
    /// No order references this gateway order (yet). The client may not have completed checkout.
    OrderNotFound(String),
    PaymentRecorded { order_number: OrderNumber, changed: bool },
    /// The store failed. The gateway will not retry, so this is logged for follow-up.
    StoreFailure(String),
}

/// Applies payment webhooks from the gateway to stored orders.
pub struct WebhookReconciler<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> WebhookReconciler<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    /// Authenticates and applies a webhook delivery.
    ///
    /// The signature is checked over `raw_body` exactly as received, before the body is parsed. Payment authorized
    /// and captured events mark the referenced order as paid. Repeated deliveries leave the order unchanged and
    /// publish nothing.
    pub async fn handle_event(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
            warn!("🪝️ Webhook received without a signature. Rejecting it.");
            WebhookError::MissingSignature
        })?;
        if !self.gateway.verify_webhook_signature(raw_body, signature) {
            warn!("🪝️ Webhook signature check failed. Rejecting it.");
            return Err(WebhookError::InvalidSignature);
        }
        let event = match serde_json::from_slice::<WebhookEvent>(raw_body) {
            Ok(event) => event,
            Err(e) => {
                warn!("🪝️ Could not parse webhook body: {e}");
                return Ok(WebhookOutcome::Malformed(e.to_string()));
            },
        };
        debug!("🪝️ Received webhook event {}", event.event);
        let outcome = match event.event_type() {
            WebhookEventType::PaymentAuthorized | WebhookEventType::PaymentCaptured => self.mark_paid(&event).await,
            _ => {
                debug!("🪝️ Ignoring {} event", event.event);
                WebhookOutcome::Ignored(event.event.clone())
            },
        };
        Ok(outcome)
    }

    async fn mark_paid(&self, event: &WebhookEvent) -> WebhookOutcome {
        let Some(payment) = event.payment() else {
            warn!("🪝️ {} event has no payment entity", event.event);
            return WebhookOutcome::Malformed("missing payment entity".to_string());
        };
        let Some(gateway_order_id) = payment.order_id.as_deref() else {
            info!("🪝️ Payment {} is not linked to a gateway order. Nothing to do.", payment.id);
            return WebhookOutcome::MissingOrderId;
        };
        match self.db.update_payment_status(gateway_order_id, PaymentStatus::Paid).await {
            Ok((old, new)) => {
                let changed = old.payment_status != PaymentStatus::Paid;
                if changed {
                    info!(
                        "🪝️ Order {} marked as paid after {} for payment {}",
                        new.order_number, event.event, payment.id
                    );
                    let event = PaymentStatusChangedEvent::new(new.clone(), old.payment_status);
                    self.producers.publish_payment_status_changed(event).await;
                } else {
                    debug!("🪝️ Order {} was already paid", new.order_number);
                }
                WebhookOutcome::PaymentRecorded { order_number: new.order_number, changed }
            },
            Err(OrderStoreError::GatewayOrderNotFound(id)) => {
                info!("🪝️ No order references gateway order {id} (payment {}). Acknowledging.", payment.id);
                WebhookOutcome::OrderNotFound(id)
            },
            Err(e) => {
                error!(
                    "🪝️ Could not record payment {} for gateway order {gateway_order_id}: {e}. Acknowledging anyway; \
                     this needs follow-up.",
                    payment.id
                );
                WebhookOutcome::StoreFailure(e.to_string())
            },
        }
    }
}
