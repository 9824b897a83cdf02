//! Thin client and helpers for the Razorpay payment gateway.
//!
//! Only the parts the canteen needs are covered: creating gateway orders (payment intents), verifying the
//! checkout-widget signature, verifying webhook signatures, and deserializing webhook payloads.
mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;
pub mod signatures;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{
    NewRazorpayOrder,
    PaymentEntity,
    PaymentEnvelope,
    RazorpayOrder,
    WebhookEvent,
    WebhookEventType,
    WebhookPayload,
};
pub use error::RazorpayApiError;
