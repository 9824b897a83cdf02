use thiserror::Error;

use crate::{
    api::checkout_api::MAX_QUANTITY,
    db_types::Money,
    traits::{CatalogError, CouponStoreError, OrderStoreError, PaymentGatewayError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error(
        "Invalid quantity {quantity} for food item {food_item_id}. Quantities must be between 1 and {max}",
        max = MAX_QUANTITY
    )]
    InvalidQuantity { food_item_id: i64, quantity: i64 },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("The submitted total of {submitted} does not match the current price of {expected}")]
    PriceMismatch { submitted: Money, expected: Money },
    #[error("{0}")]
    InvalidCoupon(String),
    #[error(
        "Some items are no longer available: {0:?}. If you have already paid, please contact support with your \
         payment reference"
    )]
    ItemUnavailable(Vec<i64>),
    #[error("Invalid payment signature")]
    PaymentVerificationFailed,
    #[error(
        "The payment of {paid} does not match the order total of {expected}. Please contact support with your \
         payment reference"
    )]
    PaymentAmountMismatch { paid: Money, expected: Money },
    #[error("Payment intent {0} is unknown to the payment gateway")]
    UnknownPaymentIntent(String),
    #[error("Payment {0} has already been used for a different order")]
    PaymentAlreadyClaimed(String),
    #[error("Orders must be paid for before they are placed")]
    PaymentRequired,
    #[error("Only administrators may update order status")]
    Forbidden,
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("Internal storage error. {0}")]
    StorageError(String),
}

impl From<OrderStoreError> for CheckoutError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(id) => CheckoutError::OrderNotFound(id),
            OrderStoreError::GatewayOrderAlreadyRecorded(id) => CheckoutError::PaymentAlreadyClaimed(id),
            OrderStoreError::DuplicateOrderNumber(n) => {
                CheckoutError::StorageError(format!("Could not allocate a unique order number (last tried {n})"))
            },
            e => CheckoutError::StorageError(e.to_string()),
        }
    }
}

impl From<CatalogError> for CheckoutError {
    fn from(e: CatalogError) -> Self {
        CheckoutError::StorageError(e.to_string())
    }
}

impl From<CouponStoreError> for CheckoutError {
    fn from(e: CouponStoreError) -> Self {
        CheckoutError::StorageError(e.to_string())
    }
}

impl From<PaymentGatewayError> for CheckoutError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::InvalidAmount(m) => {
                CheckoutError::InvalidAmount(format!("{m} cannot be charged. Amounts must be positive"))
            },
            PaymentGatewayError::GatewayUnavailable(s) => CheckoutError::GatewayUnavailable(s),
            PaymentGatewayError::IntentNotFound(id) => CheckoutError::UnknownPaymentIntent(id),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Internal storage error. {0}")]
    StorageError(String),
}

impl From<OrderStoreError> for OrderQueryError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(id) => OrderQueryError::OrderNotFound(id),
            e => OrderQueryError::StorageError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CouponApiError {
    #[error("Invalid order total: {0}")]
    InvalidOrderTotal(Money),
    #[error("Only administrators may manage coupons")]
    Forbidden,
    #[error("Coupon not found")]
    CouponNotFound(i64),
    #[error("Invalid coupon. {0}")]
    InvalidCoupon(String),
    #[error("Coupon code {0} already exists")]
    DuplicateCode(String),
    #[error("Internal storage error. {0}")]
    StorageError(String),
}

impl From<CouponStoreError> for CouponApiError {
    fn from(e: CouponStoreError) -> Self {
        match e {
            CouponStoreError::CouponNotFound(id) => CouponApiError::CouponNotFound(id),
            CouponStoreError::DuplicateCode(code) => CouponApiError::DuplicateCode(code),
            CouponStoreError::InvalidCoupon(s) => CouponApiError::InvalidCoupon(s),
            CouponStoreError::DatabaseError(s) => CouponApiError::StorageError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("Missing webhook signature")]
    MissingSignature,
    #[error("Invalid webhook signature")]
    InvalidSignature,
}
