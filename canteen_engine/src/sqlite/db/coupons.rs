use chrono::Utc;
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use super::{first_row, is_unique_violation_on};
use crate::{
    db_types::{Coupon, CouponUpdate, NewCoupon},
    traits::CouponStoreError,
};

pub async fn fetch_coupon_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE code = $1").bind(code).fetch_optional(conn).await
}

pub async fn fetch_coupon(id: i64, conn: &mut SqliteConnection) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_coupons(conn: &mut SqliteConnection) -> Result<Vec<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons ORDER BY created_at DESC, id DESC").fetch_all(conn).await
}

fn check_percentage(pct: f64) -> Result<(), CouponStoreError> {
    if (0.0..=100.0).contains(&pct) {
        Ok(())
    } else {
        Err(CouponStoreError::InvalidCoupon(format!("Discount percentage must be between 0 and 100, not {pct}")))
    }
}

fn map_code_violation(e: sqlx::Error, code: Option<String>) -> CouponStoreError {
    match code {
        Some(code) if is_unique_violation_on(&e, "coupons.code") => CouponStoreError::DuplicateCode(code),
        _ => CouponStoreError::from(e),
    }
}

pub async fn insert_coupon(coupon: NewCoupon, conn: &mut SqliteConnection) -> Result<Coupon, CouponStoreError> {
    check_percentage(coupon.discount_percentage)?;
    let code = coupon.code.clone();
    sqlx::query_as(
        r#"
            INSERT INTO coupons (code, discount_percentage, max_discount, min_order_value, active, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(coupon.code)
    .bind(coupon.discount_percentage)
    .bind(coupon.max_discount)
    .bind(coupon.min_order_value)
    .bind(coupon.active)
    .bind(coupon.expires_at)
    .bind(Utc::now())
    .fetch_all(conn)
    .await
    .and_then(first_row)
    .map_err(|e| map_code_violation(e, Some(code)))
}

pub async fn update_coupon(
    id: i64,
    update: CouponUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Coupon>, CouponStoreError> {
    if update.is_empty() {
        return Err(CouponStoreError::InvalidCoupon("No fields to update".to_string()));
    }
    if let Some(pct) = update.discount_percentage {
        check_percentage(pct)?;
    }
    let code = update.code.clone();
    let mut builder = QueryBuilder::new("UPDATE coupons SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(code) = update.code {
        set_clause.push("code = ");
        set_clause.push_bind_unseparated(code);
    }
    if let Some(pct) = update.discount_percentage {
        set_clause.push("discount_percentage = ");
        set_clause.push_bind_unseparated(pct);
    }
    if let Some(max_discount) = update.max_discount {
        set_clause.push("max_discount = ");
        set_clause.push_bind_unseparated(max_discount);
    }
    if let Some(min_order_value) = update.min_order_value {
        set_clause.push("min_order_value = ");
        set_clause.push_bind_unseparated(min_order_value);
    }
    if let Some(active) = update.active {
        set_clause.push("active = ");
        set_clause.push_bind_unseparated(active);
    }
    if let Some(expires_at) = update.expires_at {
        set_clause.push("expires_at = ");
        set_clause.push_bind_unseparated(expires_at);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<Coupon>().fetch_all(conn).await.map_err(|e| map_code_violation(e, code))?;
    Ok(rows.into_iter().next())
}

pub async fn delete_coupon(id: i64, conn: &mut SqliteConnection) -> Result<Option<Coupon>, sqlx::Error> {
    let rows: Vec<Coupon> =
        sqlx::query_as("DELETE FROM coupons WHERE id = $1 RETURNING *").bind(id).fetch_all(conn).await?;
    Ok(rows.into_iter().next())
}
