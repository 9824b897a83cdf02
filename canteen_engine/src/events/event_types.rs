use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, PaymentStatus};

/// A new order has been stored. Payment may or may not have been received; check `order.payment_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// The kitchen moved an order to a new status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType) -> Self {
        Self { order, old_status }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}

/// The gateway reported a payment outcome that changed an order's payment status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusChangedEvent {
    pub order: Order,
    pub old_status: PaymentStatus,
}

impl PaymentStatusChangedEvent {
    pub fn new(order: Order, old_status: PaymentStatus) -> Self {
        Self { order, old_status }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    PaymentStatusChanged(PaymentStatusChangedEvent),
}
