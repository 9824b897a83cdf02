//! # Canteen server
//! The HTTP front end for canteen ordering. It is responsible for:
//! * Opening gateway payment orders for a customer's cart.
//! * Verifying completed payments and placing orders.
//! * Accepting payment webhooks from the gateway and reconciling them against stored orders.
//! * Letting customers follow their orders, and kitchen staff move them along.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: Returns 200 OK.
//! * `POST /payment/create-order`: Prices the cart and opens a gateway order for the amount due.
//! * `POST /payment/verify`: Checks a payment signature returned by the checkout widget.
//! * `POST /payment/webhook`: Gateway webhook receiver. Authenticated by `X-Razorpay-Signature` only.
//! * `POST /orders`: Places an order, normally with the payment details from the checkout widget.
//! * `GET /orders`: Lists orders. Admins see everyone's, other users see their own.
//! * `GET /orders/{id}`: Fetches one order.
//! * `PATCH /orders/{id}`: Admins only. Sets the order status.
//! * `POST /coupons/validate`: Checks a coupon against an order total.
//!
//! Everything except `/health`, `/coupons/validate` and the webhook needs an `Authorization: Bearer` token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
