use thiserror::Error;

use crate::db_types::{Coupon, CouponUpdate, NewCoupon};

#[derive(Debug, Clone, Error)]
pub enum CouponStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Coupon code {0} already exists")]
    DuplicateCode(String),
    #[error("Invalid coupon: {0}")]
    InvalidCoupon(String),
    #[error("Coupon {0} does not exist")]
    CouponNotFound(i64),
}

impl From<sqlx::Error> for CouponStoreError {
    fn from(e: sqlx::Error) -> Self {
        CouponStoreError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CouponManagement {
    /// Exact, case-sensitive lookup. Inactive and expired coupons are returned too; redeemability is decided by the
    /// caller.
    async fn fetch_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponStoreError>;

    async fn fetch_coupon(&self, id: i64) -> Result<Option<Coupon>, CouponStoreError>;

    /// Every coupon, newest first.
    async fn fetch_coupons(&self) -> Result<Vec<Coupon>, CouponStoreError>;

    async fn insert_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponStoreError>;

    /// Applies the fields set in `update`. Fails with `CouponNotFound` if there is no such coupon, and with
    /// `DuplicateCode` if the new code is already taken.
    async fn update_coupon(&self, id: i64, update: CouponUpdate) -> Result<Coupon, CouponStoreError>;

    /// Removes the coupon and returns it. Orders that used the code keep it.
    async fn delete_coupon(&self, id: i64) -> Result<Coupon, CouponStoreError>;
}
