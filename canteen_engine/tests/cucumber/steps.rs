use std::str::FromStr;

use canteen_engine::{
    db_types::{CouponUpdate, Money, NewCoupon, OrderStatusType, PaymentStatus},
    helpers::is_valid_order_number,
    order_objects::{CartItem, CheckoutRequest, CouponEvaluation, Identity, OrderQueryFilter, PaymentConfirmation},
    test_utils::TestGateway,
    CouponApiError,
    CouponManagement,
    OrderManagement,
    WebhookError,
    WebhookOutcome,
};
use cucumber::{then, when};
use log::*;

use crate::cucumber::{
    canteen_world::{admin, user, CanteenSystem, PendingCheckout},
    CanteenWorld,
};

/// Parses `2 "Masala Dosa" and 1 "Filter Coffee"` into cart items.
fn parse_cart(system: &CanteenSystem, items: &str) -> Vec<CartItem> {
    items
        .split(" and ")
        .map(|part| {
            let (qty, name) = part.trim().split_once(' ').expect("Expected '<qty> \"<name>\"'");
            let qty = qty.parse::<i64>().expect("Invalid quantity");
            CartItem::new(system.food_id(name.trim_matches('"')), qty)
        })
        .collect()
}

fn money(amount: f64) -> Money {
    Money::try_from_major(amount).expect("Invalid amount")
}

async fn begin(world: &mut CanteenWorld, name: String, request: CheckoutRequest) {
    let system = world.system_mut();
    let result = system.checkout.begin_checkout(&request, &user(&name)).await;
    let intent = system.record(result);
    system.pending = Some(PendingCheckout { request, intent });
}

#[when(regex = r#"^"([^"]+)" starts a checkout for (\d+ "[^"]+"(?: and \d+ "[^"]+")*) expecting to pay ([\d.]+)$"#)]
async fn start_checkout(world: &mut CanteenWorld, name: String, items: String, amount: f64) {
    let request = CheckoutRequest::new(parse_cart(world.system(), &items)).with_expected_total(money(amount));
    begin(world, name, request).await;
}

#[when(
    regex = r#"^"([^"]+)" starts a checkout for (\d+ "[^"]+"(?: and \d+ "[^"]+")*) with coupon "([^"]*)" expecting to pay ([\d.]+)$"#
)]
async fn start_checkout_with_coupon(world: &mut CanteenWorld, name: String, items: String, code: String, amount: f64) {
    let request = CheckoutRequest::new(parse_cart(world.system(), &items))
        .with_coupon(code)
        .with_expected_total(money(amount));
    begin(world, name, request).await;
}

#[when(expr = "{string} starts a checkout with an empty cart")]
async fn empty_checkout(world: &mut CanteenWorld, name: String) {
    begin(world, name, CheckoutRequest::new(vec![])).await;
}

async fn complete(world: &mut CanteenWorld, name: String, forge: bool) {
    let pending = world.system().pending.clone().expect("No checkout has been started");
    complete_with(world, name, pending.request, forge).await;
}

async fn complete_with(world: &mut CanteenWorld, name: String, request: CheckoutRequest, forge: bool) {
    let system = world.system_mut();
    let pending = system.pending.clone().expect("No checkout has been started");
    let intent = pending.intent.expect("The checkout did not produce a payment intent");
    let payment_id = format!("pay_{}", intent.id);
    let signature = if forge {
        TestGateway::sign_payment(&intent.id, "pay_somebody_else")
    } else {
        TestGateway::sign_payment(&intent.id, &payment_id)
    };
    let confirmation = PaymentConfirmation { intent_id: intent.id.clone(), payment_id, signature };
    let result = system.checkout.complete_checkout(&confirmation, request, &user(&name)).await;
    if let Some(order) = system.record(result) {
        system.last_order = Some(order);
    }
}

#[when(expr = "{string} completes the checkout with a valid signature")]
async fn complete_checkout(world: &mut CanteenWorld, name: String) {
    complete(world, name, false).await;
}

#[when(
    regex = r#"^"([^"]+)" completes the checkout for (\d+ "[^"]+"(?: and \d+ "[^"]+")*) expecting to pay ([\d.]+) with a valid signature$"#
)]
async fn complete_checkout_for_other_cart(world: &mut CanteenWorld, name: String, items: String, amount: f64) {
    let request = CheckoutRequest::new(parse_cart(world.system(), &items)).with_expected_total(money(amount));
    complete_with(world, name, request, false).await;
}

#[when(expr = "{string} completes the checkout with a forged signature")]
async fn complete_checkout_forged(world: &mut CanteenWorld, name: String) {
    complete(world, name, true).await;
}

#[when(regex = r#"^"([^"]+)" places an unpaid order for (\d+ "[^"]+"(?: and \d+ "[^"]+")*)$"#)]
async fn unpaid_order(world: &mut CanteenWorld, name: String, items: String) {
    let system = world.system_mut();
    let request = CheckoutRequest::new(parse_cart(system, &items)).with_delivery_instructions("Table 4");
    let result = system.checkout.place_unpaid_order(request, &user(&name)).await;
    if let Some(order) = system.record(result) {
        system.last_order = Some(order);
    }
}

#[when(expr = "{string} sets the order status to {string}")]
async fn user_sets_status(world: &mut CanteenWorld, name: String, status: String) {
    set_status(world, user(&name), status).await;
}

#[when(expr = "admin {string} sets the order status to {string}")]
async fn admin_sets_status(world: &mut CanteenWorld, name: String, status: String) {
    set_status(world, admin(&name), status).await;
}

async fn set_status(world: &mut CanteenWorld, identity: Identity, status: String) {
    let system = world.system_mut();
    let order_id = system.last_order.as_ref().expect("No order in this scenario").id;
    let status = OrderStatusType::from_str(&status).expect("Invalid status");
    let result = system.checkout.update_order_status(order_id, status, &identity).await;
    if let Some(order) = system.record(result) {
        system.last_order = Some(order);
    }
}

fn webhook_body(event: &str, gateway_order_id: &str) -> String {
    format!(
        r#"{{"entity":"event","event":"{event}","contains":["payment"],"payload":{{"payment":{{"entity":{{"id":"pay_wh_1","amount":12000,"currency":"INR","status":"captured","order_id":"{gateway_order_id}"}}}}}},"created_at":1700000000}}"#
    )
}

async fn deliver_webhook(world: &mut CanteenWorld, body: String, signature: String) {
    let system = world.system_mut();
    let result = system.webhooks.handle_event(body.as_bytes(), Some(signature.as_str())).await;
    debug!("Webhook result: {result:?}");
    system.last_webhook = Some(result);
    system.last_webhook_body = Some((body, signature));
}

#[when(expr = "the gateway sends a signed {string} webhook for gateway order {string}")]
async fn signed_webhook(world: &mut CanteenWorld, event: String, gateway_order_id: String) {
    let body = webhook_body(&event, &gateway_order_id);
    let signature = TestGateway::sign_webhook(body.as_bytes());
    deliver_webhook(world, body, signature).await;
}

#[when(expr = "the gateway sends a signed {string} webhook for the pending checkout")]
async fn signed_webhook_for_pending(world: &mut CanteenWorld, event: String) {
    let intent = pending_intent_id(world.system());
    let body = webhook_body(&event, &intent);
    let signature = TestGateway::sign_webhook(body.as_bytes());
    deliver_webhook(world, body, signature).await;
}

fn pending_intent_id(system: &CanteenSystem) -> String {
    system
        .pending
        .as_ref()
        .and_then(|p| p.intent.as_ref())
        .map(|i| i.id.clone())
        .expect("No payment intent has been created")
}

#[when(expr = "the gateway sends a {string} webhook for gateway order {string} with a bad signature")]
async fn badly_signed_webhook(world: &mut CanteenWorld, event: String, gateway_order_id: String) {
    let body = webhook_body(&event, &gateway_order_id);
    let signature = TestGateway::sign_webhook(b"something else entirely");
    deliver_webhook(world, body, signature).await;
}

#[when("the gateway sends the same webhook again")]
async fn repeat_webhook(world: &mut CanteenWorld) {
    let (body, signature) = world.system().last_webhook_body.clone().expect("No webhook has been sent");
    deliver_webhook(world, body, signature).await;
}

#[when("the gateway sends a signed webhook that is not JSON")]
async fn garbage_webhook(world: &mut CanteenWorld) {
    let body = "this is not json".to_string();
    let signature = TestGateway::sign_webhook(body.as_bytes());
    deliver_webhook(world, body, signature).await;
}

async fn coupon_id(system: &CanteenSystem, code: &str) -> i64 {
    system.db.fetch_coupon_by_code(code).await.expect("Error fetching coupon").expect("No such coupon").id
}

fn record_coupon_result<T>(system: &mut CanteenSystem, result: Result<T, CouponApiError>) {
    system.last_coupon_error = result.err();
}

#[when(expr = "admin {string} creates a coupon {string} for {float} percent off")]
async fn admin_creates_coupon(world: &mut CanteenWorld, name: String, code: String, pct: f64) {
    let system = world.system_mut();
    let result = system.coupons.create_coupon(NewCoupon::new(code, pct), &admin(&name)).await;
    record_coupon_result(system, result);
}

#[when(expr = "admin {string} changes the coupon {string} to {float} percent off")]
async fn admin_changes_coupon(world: &mut CanteenWorld, name: String, code: String, pct: f64) {
    let system = world.system_mut();
    let id = coupon_id(system, &code).await;
    let update = CouponUpdate::default().with_discount_percentage(pct);
    let result = system.coupons.update_coupon(id, update, &admin(&name)).await;
    record_coupon_result(system, result);
}

#[when(expr = "admin {string} deactivates the coupon {string}")]
async fn admin_deactivates_coupon(world: &mut CanteenWorld, name: String, code: String) {
    let system = world.system_mut();
    let id = coupon_id(system, &code).await;
    let result = system.coupons.update_coupon(id, CouponUpdate::default().with_active(false), &admin(&name)).await;
    record_coupon_result(system, result);
}

#[when(expr = "admin {string} deletes the coupon {string}")]
async fn admin_deletes_coupon(world: &mut CanteenWorld, name: String, code: String) {
    let system = world.system_mut();
    let id = coupon_id(system, &code).await;
    let result = system.coupons.delete_coupon(id, &admin(&name)).await;
    record_coupon_result(system, result);
}

#[when(expr = "{string} tries to delete the coupon {string}")]
async fn user_deletes_coupon(world: &mut CanteenWorld, name: String, code: String) {
    let system = world.system_mut();
    let id = coupon_id(system, &code).await;
    let result = system.coupons.delete_coupon(id, &user(&name)).await;
    record_coupon_result(system, result);
}

#[then(expr = "the coupon change fails with {string}")]
async fn coupon_change_fails(world: &mut CanteenWorld, message: String) {
    let err = world.system().last_coupon_error.as_ref().expect("Expected the coupon change to fail");
    let text = err.to_string();
    assert!(text.contains(&message), "Expected error containing '{message}', got '{text}'");
}

#[then(expr = "admin {string} sees {int} coupon(s)")]
async fn admin_sees_coupons(world: &mut CanteenWorld, name: String, count: usize) {
    let coupons = world.system().coupons.coupons(&admin(&name)).await.expect("Error listing coupons");
    assert_eq!(coupons.len(), count);
}

#[then(expr = "a payment intent for {int} paise is created")]
async fn intent_created(world: &mut CanteenWorld, paise: i64) {
    let system = world.system();
    assert!(system.last_error.is_none(), "Unexpected error: {:?}", system.last_error);
    let intent = system.pending.as_ref().and_then(|p| p.intent.as_ref()).expect("No payment intent");
    assert_eq!(intent.amount, paise);
    assert_eq!(intent.currency, "INR");
}

#[then("no payment intent was created")]
async fn no_intent(world: &mut CanteenWorld) {
    assert_eq!(world.system().gateway.intents_created(), 0);
}

#[then(expr = "the checkout fails with {string}")]
async fn checkout_fails(world: &mut CanteenWorld, message: String) {
    let err = world.system().last_error.as_ref().expect("Expected the last step to fail, but it succeeded");
    let text = err.to_string();
    assert!(text.contains(&message), "Expected error containing '{message}', got '{text}'");
}

#[then(expr = "the order is paid with a total of {float}")]
async fn order_is_paid(world: &mut CanteenWorld, total: f64) {
    let system = world.system();
    assert!(system.last_error.is_none(), "Unexpected error: {:?}", system.last_error);
    let order = system.last_order.as_ref().expect("No order was created");
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.total_price, money(total));
    let intent = system.pending.as_ref().and_then(|p| p.intent.as_ref()).expect("No payment intent");
    assert_eq!(order.gateway_order_id.as_deref(), Some(intent.id.as_str()));
    assert_eq!(order.payment_id, Some(format!("pay_{}", intent.id)));
}

#[then(expr = "the order is unpaid with a total of {float}")]
async fn order_is_unpaid(world: &mut CanteenWorld, total: f64) {
    let system = world.system();
    assert!(system.last_error.is_none(), "Unexpected error: {:?}", system.last_error);
    let order = system.last_order.as_ref().expect("No order was created");
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.total_price, money(total));
    assert!(order.gateway_order_id.is_none());
    assert_eq!(order.delivery_instructions.as_deref(), Some("Table 4"));
}

#[then(expr = "the order was discounted to {float} with coupon {string}")]
async fn order_discounted(world: &mut CanteenWorld, price: f64, code: String) {
    let order = world.system().last_order.as_ref().expect("No order was created");
    assert_eq!(order.discounted_price, Some(money(price)));
    assert_eq!(order.coupon_code.as_deref(), Some(code.as_str()));
    assert_eq!(order.amount_payable(), money(price));
}

#[then(expr = "the order has {int} line(s)")]
async fn order_lines(world: &mut CanteenWorld, lines: usize) {
    let order = world.system().last_order.as_ref().expect("No order was created");
    assert_eq!(order.items.len(), lines);
    let sum: Money = order.items.iter().map(|i| i.line_total()).sum();
    assert_eq!(sum, order.total_price);
}

#[then("the order number is well formed")]
async fn order_number_format(world: &mut CanteenWorld) {
    let order = world.system().last_order.as_ref().expect("No order was created");
    assert!(is_valid_order_number(order.order_number.as_str()), "Bad order number {}", order.order_number);
}

#[then(expr = "{string} can see {int} order(s)")]
async fn user_order_count(world: &mut CanteenWorld, name: String, count: usize) {
    let identity = user(&name);
    let orders =
        world.system().orders.search_orders(OrderQueryFilter::default(), &identity).await.expect("Search failed");
    assert_eq!(orders.len(), count);
    assert!(orders.iter().all(|o| o.user_id == name));
}

#[then(expr = "{string} cannot see the order")]
async fn user_cannot_see(world: &mut CanteenWorld, name: String) {
    let system = world.system();
    let id = system.last_order.as_ref().expect("No order was created").id;
    assert!(system.orders.fetch_order(id, &user(&name)).await.is_err());
    assert!(system.orders.fetch_order(id, &admin("auditor")).await.is_ok());
}

#[then(expr = "there are {int} order(s) in total")]
async fn total_orders(world: &mut CanteenWorld, count: usize) {
    let orders = world.system().db.search_orders(OrderQueryFilter::default()).await.expect("Search failed");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the order status is {string}")]
async fn order_status(world: &mut CanteenWorld, status: String) {
    let system = world.system();
    let id = system.last_order.as_ref().expect("No order was created").id;
    let order = system.db.fetch_order_by_id(id).await.expect("Error fetching order").expect("Order vanished");
    assert_eq!(order.status.to_string(), status);
}

#[then(expr = "the coupon {string} is worth {float} on an order of {float}")]
async fn coupon_worth(world: &mut CanteenWorld, code: String, discount: f64, total: f64) {
    let result = world.system().coupons.evaluate(&code, money(total)).await.expect("Coupon lookup failed");
    match result {
        CouponEvaluation::Valid { discount: d, discounted_total } => {
            assert_eq!(d, money(discount));
            assert_eq!(discounted_total, money(total) - money(discount));
        },
        other => panic!("Expected a valid coupon, got {other:?}"),
    }
}

#[then(expr = "the coupon {string} is rejected on an order of {float} with {string}")]
async fn coupon_rejected(world: &mut CanteenWorld, code: String, total: f64, message: String) {
    let result = world.system().coupons.evaluate(&code, money(total)).await.expect("Coupon lookup failed");
    assert!(!result.is_valid());
    assert!(result.message().contains(&message), "Got '{}'", result.message());
}

#[then("the webhook is rejected")]
async fn webhook_rejected(world: &mut CanteenWorld) {
    let result = world.system().last_webhook.clone().expect("No webhook was sent");
    assert!(matches!(result, Err(WebhookError::InvalidSignature)), "Got {result:?}");
}

#[then(expr = "the webhook is acknowledged as {word}")]
async fn webhook_acknowledged(world: &mut CanteenWorld, outcome: String) {
    let result = world.system().last_webhook.clone().expect("No webhook was sent").expect("Webhook was rejected");
    let matched = match (outcome.as_str(), &result) {
        ("paid", WebhookOutcome::PaymentRecorded { changed: true, .. }) => true,
        ("unchanged", WebhookOutcome::PaymentRecorded { changed: false, .. }) => true,
        ("unknown-order", WebhookOutcome::OrderNotFound(_)) => true,
        ("ignored", WebhookOutcome::Ignored(_)) => true,
        ("malformed", WebhookOutcome::Malformed(_)) => true,
        _ => false,
    };
    assert!(matched, "Expected {outcome}, got {result:?}");
}

#[then(expr = "the order for the pending checkout is {word}")]
async fn pending_order_payment(world: &mut CanteenWorld, status: String) {
    let intent = pending_intent_id(world.system());
    assert_payment_status(world.system(), &intent, &status).await;
}

#[then(expr = "the order linked to {string} is {word}")]
async fn linked_order_payment(world: &mut CanteenWorld, gateway_order_id: String, status: String) {
    assert_payment_status(world.system(), &gateway_order_id, &status).await;
}

async fn assert_payment_status(system: &CanteenSystem, gateway_order_id: &str, status: &str) {
    let order = system
        .db
        .fetch_order_by_gateway_order_id(gateway_order_id)
        .await
        .expect("Error fetching order")
        .expect("No such order");
    assert_eq!(order.payment_status.to_string(), status);
}
