use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Coupon, CouponUpdate, Money, NewCoupon},
    order_objects::{CouponEvaluation, Identity},
    traits::CouponManagement,
    CouponApiError,
};

pub const INVALID_COUPON_MESSAGE: &str = "Invalid or expired coupon code";

/// Decides whether `coupon` applies to an order of `order_total` at time `now`, and what it is worth.
///
/// The discount is `discount_percentage` of the total, capped at `max_discount` when one is set, and never more than
/// the total itself. A missing, inactive, or expired coupon is invalid, as is one whose minimum order value exceeds
/// the total.
pub fn evaluate_coupon(coupon: Option<&Coupon>, order_total: Money, now: DateTime<Utc>) -> CouponEvaluation {
    let coupon = match coupon {
        Some(c) if c.is_redeemable_at(now) => c,
        _ => return CouponEvaluation::Invalid { reason: INVALID_COUPON_MESSAGE.to_string() },
    };
    if let Some(min) = coupon.min_order_value {
        if order_total < min {
            let reason = format!("Minimum order value of {min} required for this coupon");
            return CouponEvaluation::Invalid { reason };
        }
    }
    let mut discount = order_total.percent(coupon.discount_percentage);
    if let Some(max) = coupon.max_discount {
        discount = discount.min(max);
    }
    let discount = discount.clamp(Money::default(), order_total.max(Money::default()));
    CouponEvaluation::Valid { discount, discounted_total: order_total - discount }
}

/// Coupon evaluation for everyone, and coupon administration for admins.
pub struct CouponApi<B> {
    db: B,
}

impl<B> CouponApi<B>
where B: CouponManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Looks the code up (exact match) and evaluates it against `order_total`.
    pub async fn evaluate(&self, code: &str, order_total: Money) -> Result<CouponEvaluation, CouponApiError> {
        if !order_total.is_positive() {
            return Err(CouponApiError::InvalidOrderTotal(order_total));
        }
        let coupon = self.db.fetch_coupon_by_code(code).await?;
        let result = evaluate_coupon(coupon.as_ref(), order_total, Utc::now());
        debug!("🎟️ Coupon {code} against {order_total}: {}", result.message());
        Ok(result)
    }

    pub async fn coupons(&self, identity: &Identity) -> Result<Vec<Coupon>, CouponApiError> {
        require_admin(identity, "list coupons")?;
        Ok(self.db.fetch_coupons().await?)
    }

    pub async fn coupon(&self, id: i64, identity: &Identity) -> Result<Coupon, CouponApiError> {
        require_admin(identity, "view a coupon")?;
        self.db.fetch_coupon(id).await?.ok_or(CouponApiError::CouponNotFound(id))
    }

    pub async fn create_coupon(&self, coupon: NewCoupon, identity: &Identity) -> Result<Coupon, CouponApiError> {
        require_admin(identity, "create a coupon")?;
        let coupon = NewCoupon { code: coupon.code.trim().to_string(), ..coupon };
        check_code(&coupon.code)?;
        check_terms(Some(coupon.discount_percentage), coupon.max_discount, coupon.min_order_value)?;
        let coupon = self.db.insert_coupon(coupon).await?;
        info!("🎟️ {} created coupon {} ({}% off)", identity.user_id, coupon.code, coupon.discount_percentage);
        Ok(coupon)
    }

    /// Changes the fields set in `update`. An empty update returns the coupon as it is.
    pub async fn update_coupon(
        &self,
        id: i64,
        update: CouponUpdate,
        identity: &Identity,
    ) -> Result<Coupon, CouponApiError> {
        require_admin(identity, "update a coupon")?;
        if update.is_empty() {
            return self.db.fetch_coupon(id).await?.ok_or(CouponApiError::CouponNotFound(id));
        }
        let update = CouponUpdate { code: update.code.map(|c| c.trim().to_string()), ..update };
        if let Some(code) = &update.code {
            check_code(code)?;
        }
        check_terms(update.discount_percentage, update.max_discount.flatten(), update.min_order_value.flatten())?;
        let coupon = self.db.update_coupon(id, update).await?;
        info!("🎟️ {} updated coupon {} (#{id})", identity.user_id, coupon.code);
        Ok(coupon)
    }

    pub async fn delete_coupon(&self, id: i64, identity: &Identity) -> Result<Coupon, CouponApiError> {
        require_admin(identity, "delete a coupon")?;
        let coupon = self.db.delete_coupon(id).await?;
        info!("🎟️ {} deleted coupon {} (#{id})", identity.user_id, coupon.code);
        Ok(coupon)
    }
}

fn require_admin(identity: &Identity, action: &str) -> Result<(), CouponApiError> {
    if identity.is_admin {
        Ok(())
    } else {
        warn!("🎟️ {} tried to {action} without admin rights", identity.user_id);
        Err(CouponApiError::Forbidden)
    }
}

fn check_code(code: &str) -> Result<(), CouponApiError> {
    if code.is_empty() {
        Err(CouponApiError::InvalidCoupon("A coupon code is required".to_string()))
    } else {
        Ok(())
    }
}

fn check_terms(
    pct: Option<f64>,
    max_discount: Option<Money>,
    min_order_value: Option<Money>,
) -> Result<(), CouponApiError> {
    if let Some(pct) = pct {
        if !(0.0..=100.0).contains(&pct) {
            return Err(CouponApiError::InvalidCoupon(format!(
                "Discount percentage must be between 0 and 100, not {pct}"
            )));
        }
    }
    let negative = [max_discount, min_order_value].into_iter().flatten().find(|m| m.value() < 0);
    match negative {
        Some(m) => Err(CouponApiError::InvalidCoupon(format!("{m} is not a valid limit"))),
        None => Ok(()),
    }
}
