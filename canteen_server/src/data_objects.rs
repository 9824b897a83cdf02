use std::fmt::Display;

use canteen_common::helpers::filter_value;
use canteen_engine::{
    db_types::{Money, NewCoupon, Order, OrderStatusType},
    order_objects::{CartItem, CheckoutRequest, CouponEvaluation, OrderQueryFilter, PaymentConfirmation},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Body of `POST /payment/create-order`. `items` is required and an empty cart is refused. `amount` is the total the
/// customer was shown, in rupees. The amount charged is always recomputed from the catalog, and must agree with it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderRequest {
    pub amount: Money,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl From<PaymentOrderRequest> for CheckoutRequest {
    fn from(value: PaymentOrderRequest) -> Self {
        CheckoutRequest {
            items: value.items,
            coupon_code: value.coupon_code,
            expected_total: Some(value.amount),
            delivery_instructions: None,
        }
    }
}

/// Body of `POST /payment/verify`. The field names returned by the checkout widget are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

impl From<VerifyPaymentRequest> for PaymentConfirmation {
    fn from(value: VerifyPaymentRequest) -> Self {
        let VerifyPaymentRequest { gateway_order_id, payment_id, signature } = value;
        PaymentConfirmation { intent_id: gateway_order_id, payment_id, signature }
    }
}

/// Body of `POST /orders`.
///
/// Line prices sent by the client are ignored; the catalog is the only source of prices. The payment fields must be
/// supplied together or not at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default, alias = "additionalNotes")]
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub payment_order_id: Option<String>,
    #[serde(default, alias = "signature")]
    pub payment_signature: Option<String>,
}

impl NewOrderRequest {
    /// Splits the request into the cart and, if the order was paid for, the payment confirmation.
    pub fn into_parts(self) -> Result<(CheckoutRequest, Option<PaymentConfirmation>), ServerError> {
        let Self {
            items,
            total,
            coupon_code,
            delivery_instructions,
            payment_id,
            payment_order_id,
            payment_signature,
        } = self;
        let confirmation = match (payment_order_id, payment_id, payment_signature) {
            (None, None, None) => None,
            (Some(intent_id), Some(payment_id), Some(signature)) => {
                Some(PaymentConfirmation { intent_id, payment_id, signature })
            },
            _ => {
                return Err(ServerError::ValidationError(
                    "paymentOrderId, paymentId and paymentSignature must be supplied together".to_string(),
                ))
            },
        };
        let request = CheckoutRequest { items, coupon_code, expected_total: total, delivery_instructions };
        Ok((request, confirmation))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedResponse {
    pub message: String,
    pub order: Order,
    /// The human-facing order number
    pub order_id: String,
}

impl From<Order> for OrderPlacedResponse {
    fn from(order: Order) -> Self {
        let order_id = order.order_number.to_string();
        Self { message: "Order placed successfully".to_string(), order, order_id }
    }
}

/// Query string of `GET /orders`. `all`, or leaving a parameter out, means no filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<OrderListParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderListParams) -> Result<Self, Self::Error> {
        let mut query = OrderQueryFilter::default();
        if let Some(user_id) = filter_value(params.user_id.as_deref()) {
            query = query.with_user_id(user_id);
        }
        if let Some(status) = filter_value(params.status.as_deref()) {
            let status = status.parse::<OrderStatusType>().map_err(|e| ServerError::ValidationError(e.to_string()))?;
            query = query.with_status(status);
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationRequest {
    pub code: String,
    pub order_total: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_total: Option<Money>,
    pub message: String,
}

impl From<CouponEvaluation> for CouponValidationResponse {
    fn from(evaluation: CouponEvaluation) -> Self {
        let message = evaluation.message();
        match evaluation {
            CouponEvaluation::Valid { discount, discounted_total } => {
                Self { valid: true, discount: Some(discount), discounted_total: Some(discounted_total), message }
            },
            CouponEvaluation::Invalid { .. } => Self { valid: false, discount: None, discounted_total: None, message },
        }
    }
}

/// Body of `POST /coupons`. Coupons are active unless `active` says otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCouponRequest {
    pub code: String,
    pub discount_percentage: f64,
    #[serde(default)]
    pub max_discount: Option<Money>,
    #[serde(default)]
    pub min_order_value: Option<Money>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl From<NewCouponRequest> for NewCoupon {
    fn from(value: NewCouponRequest) -> Self {
        NewCoupon {
            code: value.code,
            discount_percentage: value.discount_percentage,
            max_discount: value.max_discount,
            min_order_value: value.min_order_value,
            active: value.active,
            expires_at: value.expires_at,
        }
    }
}
