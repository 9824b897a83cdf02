use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, NewOrder, NewOrderItem, OrderNumber, OrderStatusType, PaymentStatus};

/// Who is asking. Supplied by the identity provider; the engine never authenticates anyone itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn user<S: Into<String>>(user_id: S, user_name: S) -> Self {
        Self { user_id: user_id.into(), user_name: user_name.into(), is_admin: false }
    }

    pub fn admin<S: Into<String>>(user_id: S, user_name: S) -> Self {
        Self { user_id: user_id.into(), user_name: user_name.into(), is_admin: true }
    }
}

/// A line in the customer's cart. Prices are deliberately absent: they always come from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "foodItem")]
    pub food_item_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl CartItem {
    pub fn new(food_item_id: i64, quantity: i64) -> Self {
        Self { food_item_id, quantity, special_instructions: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    /// The amount the client believes it is paying. When present it must match the server's price.
    pub expected_total: Option<Money>,
    pub delivery_instructions: Option<String>,
}

impl CheckoutRequest {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items, ..Default::default() }
    }

    pub fn with_coupon<S: Into<String>>(mut self, code: S) -> Self {
        self.coupon_code = Some(code.into());
        self
    }

    pub fn with_expected_total(mut self, total: Money) -> Self {
        self.expected_total = Some(total);
        self
    }

    pub fn with_delivery_instructions<S: Into<String>>(mut self, notes: S) -> Self {
        self.delivery_instructions = Some(notes.into());
        self
    }
}

/// What the checkout widget hands back after the customer pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// A cart priced against the current catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<NewOrderItem>,
    /// Sum of line totals.
    pub total: Money,
    pub discount: Money,
    /// `total - discount`
    pub amount_due: Money,
    pub coupon_code: Option<String>,
}

impl PricedCart {
    pub fn into_new_order(self, identity: &Identity, delivery_instructions: Option<String>) -> NewOrder {
        let mut order = NewOrder::new(identity.user_id.as_str(), identity.user_name.as_str(), self.lines);
        order.total_price = self.total;
        if let Some(code) = self.coupon_code {
            order = order.with_coupon(code, self.amount_due);
        }
        order.delivery_instructions = delivery_instructions.filter(|s| !s.trim().is_empty());
        order
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponEvaluation {
    Valid { discount: Money, discounted_total: Money },
    Invalid { reason: String },
}

impl CouponEvaluation {
    pub fn is_valid(&self) -> bool {
        matches!(self, CouponEvaluation::Valid { .. })
    }

    pub fn message(&self) -> String {
        match self {
            CouponEvaluation::Valid { discount, .. } => format!("Coupon applied! You saved {discount}"),
            CouponEvaluation::Invalid { reason } => reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub order_number: Option<OrderNumber>,
    pub status: Option<OrderStatusType>,
    pub payment_status: Option<PaymentStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_order_number(mut self, order_number: OrderNumber) -> Self {
        self.order_number = Some(order_number);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.order_number.is_none()
            && self.status.is_none()
            && self.payment_status.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }
}
