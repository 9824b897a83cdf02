use std::{fmt::Display, str::FromStr};

pub use canteen_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::random_order_suffix;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// The human-readable order reference shown on receipts and in the kitchen, e.g. `ORD-7F3A9C21`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

impl OrderNumber {
    /// A fresh order number. Numbers are random, so the store is the final arbiter of uniqueness.
    pub fn random() -> Self {
        Self(format!("{ORDER_NUMBER_PREFIX}{}", random_order_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// Kitchen fulfilment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Received, not yet started.
    #[default]
    Pending,
    Preparing,
    /// Ready for pickup.
    Ready,
    Completed,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::Ready => write!(f, "Ready"),
            OrderStatusType::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            _ => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
/// A line on an order. `unit_price` is the catalog price at the moment the order was created.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub order_id: i64,
    #[serde(rename = "foodItem")]
    pub food_item_id: i64,
    pub quantity: i64,
    #[serde(rename = "price")]
    pub unit_price: Money,
    pub special_instructions: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub food_item_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub special_instructions: Option<String>,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// The line total, or `None` if it overflows.
    pub fn checked_line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    #[serde(rename = "user")]
    pub user_id: String,
    pub user_name: String,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
    /// Sum of the line totals, before any coupon. Never changes after creation.
    pub total_price: Money,
    /// The amount actually charged, when a coupon was applied.
    pub discounted_price: Option<Money>,
    pub coupon_code: Option<String>,
    pub status: OrderStatusType,
    pub delivery_instructions: Option<String>,
    pub payment_id: Option<String>,
    /// The gateway's order (payment intent) id. At most one order may reference a given intent.
    #[serde(rename = "paymentOrderId")]
    pub gateway_order_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// What the customer pays: the discounted price if a coupon was applied, otherwise the total.
    pub fn amount_payable(&self) -> Money {
        self.discounted_price.unwrap_or(self.total_price)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: String,
    /// Display name of the user, captured at creation time.
    pub user_name: String,
    pub items: Vec<NewOrderItem>,
    pub total_price: Money,
    pub discounted_price: Option<Money>,
    pub coupon_code: Option<String>,
    pub delivery_instructions: Option<String>,
    pub payment_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(user_id: S, user_name: S, items: Vec<NewOrderItem>) -> Self {
        let total_price = items.iter().map(NewOrderItem::line_total).sum();
        Self {
            order_number: OrderNumber::random(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            items,
            total_price,
            discounted_price: None,
            coupon_code: None,
            delivery_instructions: None,
            payment_id: None,
            gateway_order_id: None,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_payment<S: Into<String>>(mut self, gateway_order_id: S, payment_id: S) -> Self {
        self.gateway_order_id = Some(gateway_order_id.into());
        self.payment_id = Some(payment_id.into());
        self.payment_status = PaymentStatus::Paid;
        self
    }

    pub fn with_coupon(mut self, code: String, discounted_price: Money) -> Self {
        self.coupon_code = Some(code);
        self.discounted_price = Some(discounted_price);
        self
    }
}

//--------------------------------------     FoodCategory      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    #[default]
    Veg,
    NonVeg,
    Beverage,
    Dessert,
}

//--------------------------------------       FoodItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: FoodCategory,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFoodItem {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: FoodCategory,
    pub available: bool,
}

impl NewFoodItem {
    pub fn new<S: Into<String>>(name: S, price: Money) -> Self {
        Self { name: name.into(), description: String::new(), price, category: FoodCategory::Veg, available: true }
    }
}

//--------------------------------------        Coupon         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: i64,
    /// Matched exactly, case-sensitive.
    pub code: String,
    pub discount_percentage: f64,
    pub max_discount: Option<Money>,
    pub min_order_value: Option<Money>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Active and, if it has an expiry, not yet expired at `now`.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map_or(true, |t| t > now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub code: String,
    pub discount_percentage: f64,
    pub max_discount: Option<Money>,
    pub min_order_value: Option<Money>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCoupon {
    pub fn new<S: Into<String>>(code: S, discount_percentage: f64) -> Self {
        Self {
            code: code.into(),
            discount_percentage,
            max_discount: None,
            min_order_value: None,
            active: true,
            expires_at: None,
        }
    }
}

/// A partial change to a coupon. Absent fields are left alone. For the optional limits and the expiry, an explicit
/// `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUpdate {
    pub code: Option<String>,
    pub discount_percentage: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_discount: Option<Option<Money>>,
    #[serde(default, deserialize_with = "nullable")]
    pub min_order_value: Option<Option<Money>>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl CouponUpdate {
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn with_discount_percentage(mut self, pct: f64) -> Self {
        self.discount_percentage = Some(pct);
        self
    }

    pub fn with_max_discount(mut self, max_discount: Option<Money>) -> Self {
        self.max_discount = Some(max_discount);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() &&
            self.discount_percentage.is_none() &&
            self.max_discount.is_none() &&
            self.min_order_value.is_none() &&
            self.active.is_none() &&
            self.expires_at.is_none()
    }
}

// Present-but-null becomes `Some(None)`. Absent fields never reach here and fall back to `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//--------------------------------------     PaymentIntent     ---------------------------------------------------------
/// A gateway-side payment order. `amount` is in minor units (paise), which is what the checkout widget expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

impl PaymentIntent {
    pub fn amount_as_money(&self) -> Money {
        Money::from_paise(self.amount)
    }
}
