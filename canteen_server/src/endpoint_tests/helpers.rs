use actix_web::{
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use canteen_common::Secret;
use canteen_engine::{
    db_types::{FoodItem, Money, NewOrder, Order, OrderNumber, OrderStatusType},
    order_objects::PaymentConfirmation,
    test_utils::TestGateway,
};
use chrono::{TimeZone, Utc};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, Role, TokenIssuer, TokenValidator},
    config::AuthConfig,
    server::json_config,
};

// Signs test tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("canteen-endpoint-test-secret".to_string()) }
}

pub fn issue_token(sub: &str, name: &str, role: Role) -> String {
    TokenIssuer::new(&get_auth_config())
        .issue_token(JwtClaims::new(sub, name, role), None)
        .expect("Failed to sign token")
}

pub fn user_token() -> String {
    issue_token("u1", "Asha", Role::User)
}

pub fn admin_token() -> String {
    issue_token("chef", "Chef", Role::Admin)
}

async fn send_request<F>(req: TestRequest, auth: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let mut req = req;
    if !auth.is_empty() {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {auth}")));
    }
    let app = App::new()
        .app_data(web::Data::new(TokenValidator::new(&get_auth_config())))
        .app_data(json_config())
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?;
    let status = res.status();
    let body = test::read_body(res).await;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub async fn get_request<F>(auth: &str, path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), auth, configure).await
}

pub async fn post_request<F>(auth: &str, path: &str, body: Value, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::post().uri(path).set_json(body), auth, configure).await
}

pub async fn patch_request<F>(auth: &str, path: &str, body: Value, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::patch().uri(path).set_json(body), auth, configure).await
}

pub async fn delete_request<F>(auth: &str, path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::delete().uri(path), auth, configure).await
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

pub fn masala_dosa() -> FoodItem {
    let created = Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap();
    FoodItem {
        id: 1,
        name: "Masala Dosa".to_string(),
        description: "Crisp rice crepe with potato filling".to_string(),
        price: Money::from_rupees(120),
        category: Default::default(),
        available: true,
        created_at: created,
        updated_at: created,
    }
}

/// What the store would return after inserting `order`.
pub fn stored_order(id: i64, order: NewOrder) -> Order {
    Order {
        id,
        order_number: order.order_number,
        user_id: order.user_id,
        user_name: order.user_name,
        items: vec![],
        total_price: order.total_price,
        discounted_price: order.discounted_price,
        coupon_code: order.coupon_code,
        status: OrderStatusType::Pending,
        delivery_instructions: order.delivery_instructions,
        payment_id: order.payment_id,
        gateway_order_id: order.gateway_order_id,
        payment_status: order.payment_status,
        created_at: order.created_at,
        updated_at: order.created_at,
    }
}

pub fn sample_order(id: i64, user_id: &str) -> Order {
    let mut order = NewOrder::new(user_id, "Someone", vec![]);
    order.order_number = OrderNumber::from(format!("ORD-TEST{id:04}"));
    order.total_price = Money::from_rupees(120);
    stored_order(id, order.with_payment(format!("order_test_{id}"), format!("pay_{id}")))
}

pub fn signed_confirmation(intent_id: &str, payment_id: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        intent_id: intent_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: TestGateway::sign_payment(intent_id, payment_id),
    }
}
