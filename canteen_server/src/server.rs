use std::{path::Path, time::Duration};

use actix_web::{
    dev::Server,
    error::InternalError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
    ResponseError,
};
use canteen_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    CheckoutApi,
    CouponApi,
    OrdersApi,
    SqliteDatabase,
    WebhookReconciler,
};
use futures::future::BoxFuture;
use log::*;

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    integrations::razorpay::RazorpayGateway,
    routes::{
        health,
        CouponByIdRoute,
        CouponsRoute,
        CreateCouponRoute,
        CreateOrderRoute,
        CreatePaymentOrderRoute,
        DeleteCouponRoute,
        OrderByIdRoute,
        OrdersRoute,
        PaymentWebhookRoute,
        UpdateCouponRoute,
        UpdateOrderStatusRoute,
        ValidateCouponRoute,
        VerifyPaymentRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_directory(&config.database_url);
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    info!("🗃️ Database ready at {}", config.database_url);
    let gateway =
        RazorpayGateway::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_unpaid_orders(config.allow_unpaid_orders);
        let orders_api = OrdersApi::new(db.clone());
        let coupon_api = CouponApi::new(db.clone());
        let webhook_api = WebhookReconciler::new(db.clone(), gateway.clone(), producers.clone());
        let validator = TokenValidator::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("canteen::access_log"))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(coupon_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(web::Data::new(validator))
            .service(health)
            .service(CreatePaymentOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(CreateOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(ValidateCouponRoute::<SqliteDatabase>::new())
            .service(CouponsRoute::<SqliteDatabase>::new())
            .service(CreateCouponRoute::<SqliteDatabase>::new())
            .service(CouponByIdRoute::<SqliteDatabase>::new())
            .service(UpdateCouponRoute::<SqliteDatabase>::new())
            .service(DeleteCouponRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        debug!("💻️ Rejecting request body. {message}");
        InternalError::from_response(err, ServerError::InvalidRequestBody(message).error_response()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, ServerError::InvalidRequestPath(message).error_response()).into()
    })
}

/// Log-only subscribers. Anything that wants to react to orders (notifications, kitchen displays) hooks in here.
pub fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|ev| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let order = ev.order;
            info!(
                "📬️ New order {} from {} for {} ({})",
                order.order_number,
                order.user_name,
                order.amount_payable(),
                order.payment_status
            );
        })
    });
    hooks.on_order_status_changed(|ev| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            info!("📬️ Order {} is now {} (was {})", ev.order.order_number, ev.new_status(), ev.old_status);
        })
    });
    hooks.on_payment_status_changed(|ev| -> BoxFuture<'static, ()> {
        Box::pin(async move {
            info!(
                "📬️ Payment for order {} is now {} (was {})",
                ev.order.order_number, ev.order.payment_status, ev.old_status
            );
        })
    });
    hooks
}

fn ensure_database_directory(url: &str) {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    if path.is_empty() || path.starts_with(':') {
        return;
    }
    let path = path.split('?').next().unwrap_or(path);
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("🗃️ Could not create the database directory {}. {e}", dir.display());
        }
    }
}
