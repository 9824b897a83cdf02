use actix_web::{http::StatusCode, web};
use canteen_engine::{
    db_types::{Money, OrderStatusType, PaymentStatus},
    events::EventProducers,
    order_objects::OrderQueryFilter,
    test_utils::TestGateway,
    CheckoutApi,
    OrdersApi,
    PaymentGateway,
};
use mockall::predicate::eq;
use serde_json::json;

use super::{
    helpers::{
        admin_token,
        get_request,
        json,
        masala_dosa,
        patch_request,
        post_request,
        sample_order,
        signed_confirmation,
        stored_order,
        user_token,
    },
    mocks::MockDatabase,
};
use crate::routes::{CreateOrderRoute, OrderByIdRoute, OrdersRoute, UpdateOrderStatusRoute};

async fn place_order(db: MockDatabase, allow_unpaid: bool, body: serde_json::Value) -> (StatusCode, String) {
    place_paid_order(db, TestGateway::new(), allow_unpaid, body).await
}

async fn place_paid_order(
    db: MockDatabase,
    gateway: TestGateway,
    allow_unpaid: bool,
    body: serde_json::Value,
) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let api = CheckoutApi::new(db, gateway, EventProducers::default()).with_unpaid_orders(allow_unpaid);
    post_request(&user_token(), "/orders", body, |cfg| {
        cfg.app_data(web::Data::new(api)).service(CreateOrderRoute::<MockDatabase, TestGateway>::new());
    })
    .await
    .expect("Request failed")
}

/// A gateway that has issued `order_test_1` for `amount`.
async fn gateway_charging(amount: Money) -> TestGateway {
    let gateway = TestGateway::new();
    gateway.create_intent(amount).await.expect("Test gateway refused the intent");
    gateway
}

#[actix_web::test]
async fn paid_orders_are_created() {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_gateway_order_id().returning(|_| Ok(None));
    db.expect_fetch_food_items().returning(|_| Ok(vec![masala_dosa()]));
    db.expect_insert_order().times(1).returning(|o| Ok(stored_order(7, o)));
    let confirmation = signed_confirmation("order_test_1", "pay_1");
    let body = json!({
        "items": [{"foodItem": 1, "quantity": 2, "price": 1}],
        "total": 240,
        "additionalNotes": "Extra chutney",
        "paymentOrderId": confirmation.intent_id,
        "paymentId": confirmation.payment_id,
        "paymentSignature": confirmation.signature,
    });
    let (status, body) = place_paid_order(db, gateway_charging(Money::from_rupees(240)).await, false, body).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let response = json(&body);
    assert_eq!(response["message"], "Order placed successfully");
    assert!(response["orderId"].as_str().unwrap().starts_with("ORD-"));
    let order = &response["order"];
    assert_eq!(order["user"], "u1");
    assert_eq!(order["totalPrice"].as_f64(), Some(240.0));
    assert_eq!(order["paymentStatus"], "paid");
    assert_eq!(order["paymentOrderId"], "order_test_1");
    assert_eq!(order["deliveryInstructions"], "Extra chutney");
}

#[actix_web::test]
async fn orders_costing_more_than_the_payment_are_refused() {
    // No insert_order expectation: the order must not be stored
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_gateway_order_id().returning(|_| Ok(None));
    db.expect_fetch_food_items().returning(|_| Ok(vec![masala_dosa()]));
    let confirmation = signed_confirmation("order_test_1", "pay_1");
    let body = json!({
        "items": [{"foodItem": 1, "quantity": 2}],
        "total": 240,
        "paymentOrderId": confirmation.intent_id,
        "paymentId": confirmation.payment_id,
        "paymentSignature": confirmation.signature,
    });
    let (status, body) = place_paid_order(db, gateway_charging(Money::from_rupees(1)).await, false, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let error = json(&body)["error"].as_str().unwrap_or_default().to_string();
    assert!(error.contains("does not match the order total"), "{error}");
}

#[actix_web::test]
async fn unpaid_orders_are_refused_unless_enabled() {
    let body = json!({"items": [{"foodItem": 1, "quantity": 1}], "total": 120});
    let (status, body) = place_order(MockDatabase::new(), false, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Orders must be paid for before they are placed");
}

#[actix_web::test]
async fn unpaid_orders_are_stored_as_pending_when_enabled() {
    let mut db = MockDatabase::new();
    db.expect_fetch_food_items().returning(|_| Ok(vec![masala_dosa()]));
    db.expect_insert_order().times(1).returning(|o| Ok(stored_order(8, o)));
    let body = json!({"items": [{"foodItem": 1, "quantity": 1}], "total": 120});
    let (status, body) = place_order(db, true, body).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(json(&body)["order"]["paymentStatus"], "pending");
}

#[actix_web::test]
async fn orders_with_bad_signatures_are_refused() {
    let mut confirmation = signed_confirmation("order_test_1", "pay_1");
    confirmation.payment_id = "pay_2".to_string();
    let body = json!({
        "items": [{"foodItem": 1, "quantity": 1}],
        "paymentOrderId": confirmation.intent_id,
        "paymentId": confirmation.payment_id,
        "paymentSignature": confirmation.signature,
    });
    // No expectations on the store: it must not be touched
    let (status, body) = place_order(MockDatabase::new(), false, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid payment signature");
}

#[actix_web::test]
async fn users_only_list_their_own_orders() {
    let mut db = MockDatabase::new();
    let expected = OrderQueryFilter::default().with_user_id("u1").with_status(OrderStatusType::Ready);
    db.expect_search_orders().with(eq(expected)).times(1).returning(|_| Ok(vec![sample_order(1, "u1")]));
    let api = OrdersApi::new(db);
    let (status, body) = get_request(&user_token(), "/orders?userId=u9&status=ready", |cfg| {
        cfg.app_data(web::Data::new(api)).service(OrdersRoute::<MockDatabase>::new());
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK, "{body}");
    let orders = json(&body);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["orderNumber"], "ORD-TEST0001");
}

#[actix_web::test]
async fn admins_can_list_everything() {
    let mut db = MockDatabase::new();
    db.expect_search_orders()
        .with(eq(OrderQueryFilter::default()))
        .times(1)
        .returning(|_| Ok(vec![sample_order(2, "u2"), sample_order(1, "u1")]));
    let api = OrdersApi::new(db);
    let (status, body) = get_request(&admin_token(), "/orders?userId=all&status=all", |cfg| {
        cfg.app_data(web::Data::new(api)).service(OrdersRoute::<MockDatabase>::new());
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body).as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn unknown_status_filters_are_rejected() {
    let api = OrdersApi::new(MockDatabase::new());
    let (status, _) = get_request(&admin_token(), "/orders?status=eaten", |cfg| {
        cfg.app_data(web::Data::new(api)).service(OrdersRoute::<MockDatabase>::new());
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn other_users_orders_are_not_found() {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_id().with(eq(5)).returning(|id| Ok(Some(sample_order(id, "u2"))));
    let api = OrdersApi::new(db);
    let (status, body) = get_request(&user_token(), "/orders/5", |cfg| {
        cfg.app_data(web::Data::new(api)).service(OrderByIdRoute::<MockDatabase>::new());
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}

#[actix_web::test]
async fn owners_can_fetch_their_order() {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_id().with(eq(5)).returning(|id| Ok(Some(sample_order(id, "u1"))));
    let api = OrdersApi::new(db);
    let (status, body) = get_request(&user_token(), "/orders/5", |cfg| {
        cfg.app_data(web::Data::new(api)).service(OrderByIdRoute::<MockDatabase>::new());
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["id"], 5);
}

async fn patch_status(db: MockDatabase, token: &str) -> (StatusCode, String) {
    let api = CheckoutApi::new(db, TestGateway::new(), EventProducers::default());
    patch_request(token, "/orders/3", json!({"status": "Ready"}), |cfg| {
        cfg.app_data(web::Data::new(api)).service(UpdateOrderStatusRoute::<MockDatabase, TestGateway>::new());
    })
    .await
    .expect("Request failed")
}

#[actix_web::test]
async fn customers_cannot_change_order_status() {
    let (status, _) = patch_status(MockDatabase::new(), &user_token()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_can_change_order_status() {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_id().with(eq(3)).returning(|id| Ok(Some(sample_order(id, "u1"))));
    db.expect_update_order_status().with(eq(3), eq(OrderStatusType::Ready)).times(1).returning(|id, status| {
        let mut order = sample_order(id, "u1");
        order.status = status;
        Ok(order)
    });
    let (status, body) = patch_status(db, &admin_token()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json(&body);
    assert_eq!(order["status"], "Ready");
    assert_eq!(order["paymentStatus"], PaymentStatus::Paid.to_string());
}

#[actix_web::test]
async fn missing_orders_cannot_be_updated() {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(None));
    let (status, _) = patch_status(db, &admin_token()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
