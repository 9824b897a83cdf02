use std::{collections::HashMap, fmt::Debug};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{FoodItem, Money, NewOrder, NewOrderItem, Order, OrderNumber, OrderStatusType, PaymentIntent},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    order_objects::{CartItem, CheckoutRequest, CouponEvaluation, Identity, PaymentConfirmation, PricedCart},
    evaluate_coupon,
    traits::{CanteenDatabase, OrderStoreError, PaymentGateway},
    CheckoutError,
};

/// The largest difference between a client-submitted total and the server's own price that is still accepted.
pub const PRICE_TOLERANCE: Money = Money::from_paise(1);

/// The most of any one item a single cart line may ask for.
pub const MAX_QUANTITY: i64 = 1_000;

/// `CheckoutApi` is the order lifecycle controller.
///
/// A checkout happens in two steps:
/// 1. [`begin_checkout`](CheckoutApi::begin_checkout) prices the cart against the catalog and opens a payment intent
///    with the gateway. Nothing is stored.
/// 2. After the customer pays, [`complete_checkout`](CheckoutApi::complete_checkout) verifies the gateway signature,
///    prices the cart again, checks that the gateway charged exactly that amount and creates the order as paid.
///
/// Prices always come from the catalog. A client-submitted total is only ever compared against the server's price.
/// An order is created at most once per payment intent.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    allow_unpaid_orders: bool,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi (unpaid orders allowed: {})", self.allow_unpaid_orders)
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: CanteenDatabase,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, allow_unpaid_orders: false }
    }

    /// Permit orders that skip the payment step. They are stored with payment status `pending`.
    pub fn with_unpaid_orders(mut self, allow: bool) -> Self {
        self.allow_unpaid_orders = allow;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Prices `items` at current catalog prices and applies `coupon_code`, if given.
    ///
    /// Fails if the cart is empty, a quantity is out of range, any item is unknown or unavailable, or the coupon does
    /// not apply.
    pub async fn price_cart(&self, items: &[CartItem], coupon_code: Option<&str>) -> Result<PricedCart, CheckoutError> {
        validate_cart(items)?;
        let mut ids = items.iter().map(|i| i.food_item_id).collect::<Vec<i64>>();
        ids.sort_unstable();
        ids.dedup();
        let catalog = self.db.fetch_food_items(&ids).await?;
        let menu = catalog.iter().map(|f| (f.id, f)).collect::<HashMap<i64, &FoodItem>>();
        let unavailable = ids
            .iter()
            .filter(|id| menu.get(*id).map_or(true, |f| !f.available))
            .copied()
            .collect::<Vec<i64>>();
        if !unavailable.is_empty() {
            debug!("🛒️ Cart contains unavailable items: {unavailable:?}");
            return Err(CheckoutError::ItemUnavailable(unavailable));
        }
        let lines = items
            .iter()
            .filter_map(|item| {
                menu.get(&item.food_item_id).map(|food| NewOrderItem {
                    food_item_id: item.food_item_id,
                    quantity: item.quantity,
                    unit_price: food.price,
                    special_instructions: item.special_instructions.clone().filter(|s| !s.trim().is_empty()),
                })
            })
            .collect::<Vec<_>>();
        let total = lines
            .iter()
            .try_fold(Money::default(), |acc, line| line.checked_line_total().and_then(|t| acc.checked_add(t)))
            .ok_or_else(|| CheckoutError::InvalidAmount("The cart total is too large".to_string()))?;
        let code = coupon_code.map(str::trim).filter(|c| !c.is_empty());
        let (discount, coupon_code) = match code {
            Some(code) => {
                let coupon = self.db.fetch_coupon_by_code(code).await?;
                match evaluate_coupon(coupon.as_ref(), total, Utc::now()) {
                    CouponEvaluation::Valid { discount, .. } => (discount, Some(code.to_string())),
                    CouponEvaluation::Invalid { reason } => return Err(CheckoutError::InvalidCoupon(reason)),
                }
            },
            None => (Money::default(), None),
        };
        trace!("🛒️ Cart priced at {total} less {discount}");
        Ok(PricedCart { lines, total, discount, amount_due: total - discount, coupon_code })
    }

    /// Prices the cart and opens a payment intent for the amount due. Creates no order.
    pub async fn begin_checkout(
        &self,
        request: &CheckoutRequest,
        identity: &Identity,
    ) -> Result<PaymentIntent, CheckoutError> {
        if let Some(total) = request.expected_total {
            if !total.is_positive() {
                return Err(CheckoutError::InvalidAmount(format!("{total} is not a payable amount")));
            }
        }
        let priced = self.price_cart(&request.items, request.coupon_code.as_deref()).await?;
        check_expected_total(&priced, request.expected_total)?;
        let intent = self.gateway.create_intent(priced.amount_due).await?;
        info!(
            "🛒️ Checkout started for {} ({}). Payment intent {} for {}",
            identity.user_name, identity.user_id, intent.id, priced.amount_due
        );
        Ok(intent)
    }

    /// Checks the gateway signature for a payment without touching any order.
    pub fn verify_payment(&self, confirmation: &PaymentConfirmation) -> Result<(), CheckoutError> {
        let PaymentConfirmation { intent_id, payment_id, signature } = confirmation;
        if self.gateway.verify_signature(intent_id, payment_id, signature) {
            debug!("🛒️ Payment {payment_id} for intent {intent_id} verified");
            Ok(())
        } else {
            warn!("🛒️ Invalid payment signature for intent {intent_id}, payment {payment_id}");
            Err(CheckoutError::PaymentVerificationFailed)
        }
    }

    /// Verifies the payment and creates a paid order for the cart.
    ///
    /// Replaying the same confirmation returns the order that was already created for it, provided the same user
    /// asks. Any other user gets `PaymentAlreadyClaimed`.
    pub async fn complete_checkout(
        &self,
        confirmation: &PaymentConfirmation,
        request: CheckoutRequest,
        identity: &Identity,
    ) -> Result<Order, CheckoutError> {
        let PaymentConfirmation { intent_id, payment_id, signature } = confirmation;
        if !self.gateway.verify_signature(intent_id, payment_id, signature) {
            warn!(
                "🛒️ Invalid payment signature from {} for intent {intent_id}, payment {payment_id}",
                identity.user_id
            );
            return Err(CheckoutError::PaymentVerificationFailed);
        }
        if let Some(existing) = self.db.fetch_order_by_gateway_order_id(intent_id).await? {
            return replayed_order(existing, intent_id, identity);
        }
        let priced = match self.price_cart(&request.items, request.coupon_code.as_deref()).await {
            Ok(p) => p,
            Err(e @ CheckoutError::ItemUnavailable(_)) => {
                error!(
                    "🛒️ Payment {payment_id} (intent {intent_id}) from {} was captured, but the cart can no longer \
                     be fulfilled: {e}. This needs manual reconciliation.",
                    identity.user_id
                );
                return Err(e);
            },
            Err(e) => return Err(e),
        };
        if let Err(e) = check_expected_total(&priced, request.expected_total) {
            error!(
                "🛒️ Payment {payment_id} (intent {intent_id}) from {} was captured, but {e}. This needs manual \
                 reconciliation.",
                identity.user_id
            );
            return Err(e);
        }
        let intent = self.gateway.fetch_intent(intent_id).await?;
        if let Err(e) = check_paid_amount(&priced, &intent) {
            error!(
                "🛒️ Payment {payment_id} (intent {intent_id}) from {} was captured, but {e}. This needs manual \
                 reconciliation.",
                identity.user_id
            );
            return Err(e);
        }
        let order = priced
            .into_new_order(identity, request.delivery_instructions)
            .with_payment(intent_id.as_str(), payment_id.as_str());
        let order = match self.insert_order(order).await {
            Ok(order) => order,
            Err(OrderStoreError::GatewayOrderAlreadyRecorded(_)) => {
                // Lost a race with a concurrent completion of the same payment
                let existing = self
                    .db
                    .fetch_order_by_gateway_order_id(intent_id)
                    .await?
                    .ok_or_else(|| CheckoutError::StorageError(format!("Order for {intent_id} vanished")))?;
                return replayed_order(existing, intent_id, identity);
            },
            Err(e) => return Err(e.into()),
        };
        info!(
            "🛒️ Order {} created for {} ({}). Paid {} with {payment_id}",
            order.order_number,
            order.user_name,
            order.user_id,
            order.amount_payable()
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Creates an order without a payment. Only permitted when unpaid orders are enabled.
    pub async fn place_unpaid_order(
        &self,
        request: CheckoutRequest,
        identity: &Identity,
    ) -> Result<Order, CheckoutError> {
        if !self.allow_unpaid_orders {
            return Err(CheckoutError::PaymentRequired);
        }
        let priced = self.price_cart(&request.items, request.coupon_code.as_deref()).await?;
        check_expected_total(&priced, request.expected_total)?;
        let order = priced.into_new_order(identity, request.delivery_instructions);
        let order = self.insert_order(order).await?;
        info!("🛒️ Unpaid order {} created for {} ({})", order.order_number, order.user_name, order.user_id);
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Moves an order to `new_status`. Administrators only. Any transition between the four statuses is allowed.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        identity: &Identity,
    ) -> Result<Order, CheckoutError> {
        if !identity.is_admin {
            warn!("🛒️ {} tried to set order {order_id} to {new_status} without admin rights", identity.user_id);
            return Err(CheckoutError::Forbidden);
        }
        let old = self.db.fetch_order_by_id(order_id).await?.ok_or(CheckoutError::OrderNotFound(order_id))?;
        if old.status == new_status {
            debug!("🛒️ Order {} is already {new_status}", old.order_number);
            return Ok(old);
        }
        let order = self.db.update_order_status(order_id, new_status).await?;
        info!("🛒️ Order {} moved from {} to {new_status} by {}", order.order_number, old.status, identity.user_id);
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(order.clone(), old.status)).await;
        Ok(order)
    }

    /// Inserts the order, retrying once with a fresh order number if the first one was taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        match self.db.insert_order(order.clone()).await {
            Err(OrderStoreError::DuplicateOrderNumber(n)) => {
                warn!("🛒️ Order number {n} collided. Retrying with a new number");
                let order = NewOrder { order_number: OrderNumber::random(), ..order };
                self.db.insert_order(order).await
            },
            result => result,
        }
    }
}

fn validate_cart(items: &[CartItem]) -> Result<(), CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    match items.iter().find(|i| !(1..=MAX_QUANTITY).contains(&i.quantity)) {
        Some(item) => {
            Err(CheckoutError::InvalidQuantity { food_item_id: item.food_item_id, quantity: item.quantity })
        },
        None => Ok(()),
    }
}

fn check_expected_total(priced: &PricedCart, expected: Option<Money>) -> Result<(), CheckoutError> {
    match expected {
        Some(submitted) if submitted.abs_diff(priced.amount_due) > PRICE_TOLERANCE => {
            Err(CheckoutError::PriceMismatch { submitted, expected: priced.amount_due })
        },
        _ => Ok(()),
    }
}

/// The gateway charges exactly the intent amount, so it must match what the cart costs now.
fn check_paid_amount(priced: &PricedCart, intent: &PaymentIntent) -> Result<(), CheckoutError> {
    let paid = intent.amount_as_money();
    if paid.abs_diff(priced.amount_due) > PRICE_TOLERANCE {
        Err(CheckoutError::PaymentAmountMismatch { paid, expected: priced.amount_due })
    } else {
        Ok(())
    }
}

fn replayed_order(existing: Order, intent_id: &str, identity: &Identity) -> Result<Order, CheckoutError> {
    if existing.is_owned_by(&identity.user_id) {
        info!("🛒️ Payment intent {intent_id} was already completed as order {}. Returning it", existing.order_number);
        Ok(existing)
    } else {
        warn!(
            "🛒️ {} tried to claim payment intent {intent_id}, which belongs to order {} of {}",
            identity.user_id, existing.order_number, existing.user_id
        );
        Err(CheckoutError::PaymentAlreadyClaimed(intent_id.to_string()))
    }
}
