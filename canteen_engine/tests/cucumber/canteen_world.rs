use std::{collections::HashMap, fmt::Debug};

use canteen_engine::{
    db_types::{Order, PaymentIntent},
    order_objects::{CheckoutRequest, Identity},
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        TestGateway,
    },
    CheckoutApi,
    CheckoutError,
    CouponApi,
    CouponApiError,
    OrdersApi,
    SqliteDatabase,
    WebhookError,
    WebhookOutcome,
    WebhookReconciler,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct CanteenWorld {
    pub system: Option<CanteenSystem>,
}

impl CanteenWorld {
    pub fn system(&self) -> &CanteenSystem {
        self.system.as_ref().expect("Canteen not initialised. Start the scenario with 'a fresh canteen'")
    }

    pub fn system_mut(&mut self) -> &mut CanteenSystem {
        self.system.as_mut().expect("Canteen not initialised. Start the scenario with 'a fresh canteen'")
    }
}

/// A checkout that has been started (or attempted) and may be completed later in the scenario.
#[derive(Debug, Clone)]
pub struct PendingCheckout {
    pub request: CheckoutRequest,
    pub intent: Option<PaymentIntent>,
}

pub struct CanteenSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: TestGateway,
    pub checkout: CheckoutApi<SqliteDatabase, TestGateway>,
    pub orders: OrdersApi<SqliteDatabase>,
    pub coupons: CouponApi<SqliteDatabase>,
    pub webhooks: WebhookReconciler<SqliteDatabase, TestGateway>,
    pub menu: HashMap<String, i64>,
    pub pending: Option<PendingCheckout>,
    pub last_order: Option<Order>,
    pub last_error: Option<CheckoutError>,
    pub last_coupon_error: Option<CouponApiError>,
    pub last_webhook: Option<Result<WebhookOutcome, WebhookError>>,
    pub last_webhook_body: Option<(String, String)>,
}

impl Debug for CanteenSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CanteenSystem ({})", self.db_path)
    }
}

impl CanteenSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let gateway = TestGateway::new();
        let checkout = CheckoutApi::new(db.clone(), gateway.clone(), Default::default()).with_unpaid_orders(true);
        let orders = OrdersApi::new(db.clone());
        let coupons = CouponApi::new(db.clone());
        let webhooks = WebhookReconciler::new(db.clone(), gateway.clone(), Default::default());
        Self {
            db_path: url,
            db,
            gateway,
            checkout,
            orders,
            coupons,
            webhooks,
            menu: HashMap::new(),
            pending: None,
            last_order: None,
            last_error: None,
            last_coupon_error: None,
            last_webhook: None,
            last_webhook_body: None,
        }
    }

    pub fn food_id(&self, name: &str) -> i64 {
        *self.menu.get(name).unwrap_or_else(|| panic!("{name} is not on the menu"))
    }

    pub fn record<T>(&mut self, result: Result<T, CheckoutError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("Step produced error: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

pub fn user(name: &str) -> Identity {
    Identity::user(name.to_string(), capitalise(name))
}

pub fn admin(name: &str) -> Identity {
    Identity::admin(name.to_string(), capitalise(name))
}

fn capitalise(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
