use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{first_row, is_unique_violation_on};
use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType, PaymentStatus},
    order_objects::OrderQueryFilter,
    traits::OrderStoreError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic. Embed the call in a
/// transaction and pass `&mut tx` as the connection argument so that a failed item insert leaves no partial order.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let NewOrder {
        order_number,
        user_id,
        user_name,
        items,
        total_price,
        discounted_price,
        coupon_code,
        delivery_instructions,
        payment_id,
        gateway_order_id,
        payment_status,
        created_at,
    } = order;
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                user_name,
                total_price,
                discounted_price,
                coupon_code,
                status,
                delivery_instructions,
                payment_id,
                gateway_order_id,
                payment_status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(user_id)
    .bind(user_name)
    .bind(total_price)
    .bind(discounted_price)
    .bind(coupon_code)
    .bind(OrderStatusType::Pending)
    .bind(delivery_instructions)
    .bind(payment_id)
    .bind(gateway_order_id.clone())
    .bind(payment_status)
    .bind(created_at)
    .bind(created_at)
    .fetch_all(&mut *conn)
    .await
    .and_then(first_row)
    .map_err(|e| {
        if is_unique_violation_on(&e, "orders.order_number") {
            OrderStoreError::DuplicateOrderNumber(order_number.clone())
        } else if is_unique_violation_on(&e, "orders.gateway_order_id") {
            OrderStoreError::GatewayOrderAlreadyRecorded(gateway_order_id.clone().unwrap_or_default())
        } else {
            OrderStoreError::from(e)
        }
    })?;
    trace!("🗃️ Order row {} inserted as {}", inserted.id, inserted.order_number);
    for item in items {
        let item = insert_order_item(inserted.id, item, &mut *conn).await?;
        inserted.items.push(item);
    }
    debug!("🗃️ Order {} saved with {} line(s)", inserted.order_number, inserted.items.len());
    Ok(inserted)
}

async fn insert_order_item(
    order_id: i64,
    item: NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, food_item_id, quantity, unit_price, special_instructions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.food_item_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.special_instructions)
    .fetch_all(conn)
    .await
    .and_then(first_row)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

async fn with_items(order: Option<Order>, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    match order {
        Some(mut order) => {
            order.items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    with_items(order, conn).await
}

pub async fn fetch_order_by_gateway_order_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(&mut *conn)
        .await?;
    with_items(order, conn).await
}

pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let rows: Vec<Order> = sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    with_items(rows.into_iter().next(), conn).await
}

pub async fn update_payment_status(
    gateway_order_id: &str,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let rows: Vec<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = $1, updated_at = $2 WHERE gateway_order_id = $3 RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(gateway_order_id)
    .fetch_all(&mut *conn)
    .await?;
    with_items(rows.into_iter().next(), conn).await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in descending order (newest first)
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(order_number) = query.order_number {
        where_clause.push("order_number = ");
        where_clause.push_bind_unseparated(order_number.to_string());
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(payment_status) = query.payment_status {
        where_clause.push("payment_status = ");
        where_clause.push_bind_unseparated(payment_status);
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(&mut *conn).await?;
    let mut result = Vec::with_capacity(orders.len());
    for mut order in orders {
        order.items = fetch_order_items(order.id, &mut *conn).await?;
        result.push(order);
    }
    trace!("🗃️ Result of search_orders: {} orders", result.len());
    Ok(result)
}
