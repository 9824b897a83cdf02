//! `SqliteDatabase` is a concrete implementation of a canteen engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{catalog, coupons, db_url, new_pool, orders};
use crate::{
    db_types::{
        Coupon,
        CouponUpdate,
        FoodItem,
        NewCoupon,
        NewFoodItem,
        NewOrder,
        Order,
        OrderStatusType,
        PaymentStatus,
    },
    order_objects::OrderQueryFilter,
    traits::{
        CatalogError,
        CatalogManagement,
        CouponManagement,
        CouponStoreError,
        OrderManagement,
        OrderStoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CANTEEN_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created new SQLite pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order {} (#{}) created for {}", order.order_number, order.id, order.user_id);
        Ok(order)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_gateway_order_id(gateway_order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_order_status(&self, id: i64, status: OrderStatusType) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::update_order_status(id, status, &mut tx).await?.ok_or(OrderStoreError::OrderNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Order {} is now {status}", order.order_number);
        Ok(order)
    }

    async fn update_payment_status(
        &self,
        gateway_order_id: &str,
        status: PaymentStatus,
    ) -> Result<(Order, Order), OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let old = orders::fetch_order_by_gateway_order_id(gateway_order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::GatewayOrderNotFound(gateway_order_id.to_string()))?;
        let new = orders::update_payment_status(gateway_order_id, status, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::GatewayOrderNotFound(gateway_order_id.to_string()))?;
        tx.commit().await?;
        debug!("🗃️ Payment status of order {} changed from {} to {}", new.order_number, old.payment_status, status);
        Ok((old, new))
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_food_items(&self, ids: &[i64]) -> Result<Vec<FoodItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let items = catalog::fetch_food_items(ids, &mut conn).await?;
        Ok(items)
    }

    async fn insert_food_item(&self, item: NewFoodItem) -> Result<FoodItem, CatalogError> {
        if item.price.value() < 0 {
            return Err(CatalogError::InvalidFoodItem(format!("{} has a negative price", item.name)));
        }
        let mut tx = self.pool.begin().await?;
        let item = catalog::insert_food_item(item, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Added {} to the menu at {}", item.name, item.price);
        Ok(item)
    }

    async fn set_food_item_availability(&self, id: i64, available: bool) -> Result<FoodItem, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let item =
            catalog::set_availability(id, available, &mut tx).await?.ok_or(CatalogError::FoodItemNotFound(id))?;
        tx.commit().await?;
        Ok(item)
    }
}

impl CouponManagement for SqliteDatabase {
    async fn fetch_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponStoreError> {
        let mut conn = self.pool.acquire().await?;
        let coupon = coupons::fetch_coupon_by_code(code, &mut conn).await?;
        Ok(coupon)
    }

    async fn fetch_coupon(&self, id: i64) -> Result<Option<Coupon>, CouponStoreError> {
        let mut conn = self.pool.acquire().await?;
        let coupon = coupons::fetch_coupon(id, &mut conn).await?;
        Ok(coupon)
    }

    async fn fetch_coupons(&self) -> Result<Vec<Coupon>, CouponStoreError> {
        let mut conn = self.pool.acquire().await?;
        let coupons = coupons::fetch_coupons(&mut conn).await?;
        Ok(coupons)
    }

    async fn insert_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponStoreError> {
        let mut tx = self.pool.begin().await?;
        let coupon = coupons::insert_coupon(coupon, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Coupon {} created ({}% off)", coupon.code, coupon.discount_percentage);
        Ok(coupon)
    }

    async fn update_coupon(&self, id: i64, update: CouponUpdate) -> Result<Coupon, CouponStoreError> {
        let mut tx = self.pool.begin().await?;
        let coupon = coupons::update_coupon(id, update, &mut tx).await?.ok_or(CouponStoreError::CouponNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Coupon {} (#{id}) updated", coupon.code);
        Ok(coupon)
    }

    async fn delete_coupon(&self, id: i64) -> Result<Coupon, CouponStoreError> {
        let mut tx = self.pool.begin().await?;
        let coupon = coupons::delete_coupon(id, &mut tx).await?.ok_or(CouponStoreError::CouponNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Coupon {} (#{id}) deleted", coupon.code);
        Ok(coupon)
    }
}
