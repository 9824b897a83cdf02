use chrono::Utc;
use sqlx::{QueryBuilder, SqliteConnection};

use super::first_row;
use crate::db_types::{FoodItem, NewFoodItem};

pub async fn fetch_food_items(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<FoodItem>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM food_items WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    builder.push(")");
    builder.build_query_as::<FoodItem>().fetch_all(conn).await
}

pub async fn insert_food_item(item: NewFoodItem, conn: &mut SqliteConnection) -> Result<FoodItem, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO food_items (name, description, price, category, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(item.name)
    .bind(item.description)
    .bind(item.price)
    .bind(item.category)
    .bind(item.available)
    .bind(now)
    .bind(now)
    .fetch_all(conn)
    .await
    .and_then(first_row)
}

pub async fn set_availability(
    id: i64,
    available: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<FoodItem>, sqlx::Error> {
    sqlx::query_as::<_, FoodItem>("UPDATE food_items SET available = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(available)
        .bind(Utc::now())
        .bind(id)
        .fetch_all(conn)
        .await
        .map(|rows| rows.into_iter().next())
}
