pub mod checkout_api;
pub mod coupon_api;
pub mod errors;
pub mod order_objects;
pub mod orders_api;
pub mod webhook_api;
