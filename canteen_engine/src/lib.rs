//! Canteen Engine
//!
//! The core of the canteen ordering service: it turns a cart into a paid order and keeps order payment state in
//! line with what the payment gateway reports. Nothing in here knows about HTTP.
//!
//! The library is divided into these sections:
//! 1. Data types ([`mod@db_types`]) and the storage traits ([`mod@traits`]) a backend must implement. SQLite is the
//!    supported backend ([`SqliteDatabase`]).
//! 2. The public API:
//!    * [`CheckoutApi`] is the order lifecycle controller. It prices carts against the catalog, opens payment intents,
//!      verifies client-reported payments and creates orders, and applies kitchen status updates.
//!    * [`OrdersApi`] answers order queries, honouring visibility rules.
//!    * [`CouponApi`] evaluates coupon codes against an order total and lets administrators manage coupons.
//!    * [`WebhookReconciler`] applies signed gateway webhook events to stored orders.
//! 3. Events ([`mod@events`]). Order creation, status changes and payment changes are published to subscribers
//!    that were handed to the APIs at construction.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod api;

#[cfg(feature = "sqlite")]
mod sqlite;

/// Helpers for tests in this and downstream crates: throwaway databases and an in-process gateway.
#[cfg(feature = "sqlite")]
pub mod test_utils;

pub use api::{
    checkout_api::{CheckoutApi, MAX_QUANTITY, PRICE_TOLERANCE},
    coupon_api::{evaluate_coupon, CouponApi},
    errors::{CheckoutError, CouponApiError, OrderQueryError, WebhookError},
    order_objects,
    orders_api::OrdersApi,
    webhook_api::{WebhookOutcome, WebhookReconciler},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CanteenDatabase,
    CatalogError,
    CatalogManagement,
    CouponManagement,
    CouponStoreError,
    OrderManagement,
    OrderStoreError,
    PaymentGateway,
    PaymentGatewayError,
};
