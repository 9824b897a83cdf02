use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, PaymentStatus},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order number {0} is already in use")]
    DuplicateOrderNumber(OrderNumber),
    #[error("An order for gateway order {0} has already been recorded")]
    GatewayOrderAlreadyRecorded(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("No order references gateway order {0}")]
    GatewayOrderNotFound(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// Durable storage of orders.
///
/// Order numbers and gateway order ids are unique across all orders. `total_price` never changes after creation,
/// and a gateway order id, once set, is never replaced.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Inserts the order and its items atomically. Fails with `DuplicateOrderNumber` or
    /// `GatewayOrderAlreadyRecorded` if either unique key is already taken; nothing is written in that case.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_gateway_order_id(&self, gateway_order_id: &str)
        -> Result<Option<Order>, OrderStoreError>;

    /// Sets the kitchen status and returns the updated order.
    async fn update_order_status(&self, id: i64, status: OrderStatusType) -> Result<Order, OrderStoreError>;

    /// Sets the payment status of the order referencing `gateway_order_id`. Returns the order as it was before and
    /// after the update.
    async fn update_payment_status(
        &self,
        gateway_order_id: &str,
        status: PaymentStatus,
    ) -> Result<(Order, Order), OrderStoreError>;

    /// Orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
}
