//! Seams between the engine and its collaborators.
//!
//! A storage backend implements [`OrderManagement`], [`CatalogManagement`] and [`CouponManagement`] (and thereby
//! [`CanteenDatabase`]). A payment provider implements [`PaymentGateway`].
mod catalog_management;
mod coupon_management;
mod order_management;
mod payment_gateway;

pub use catalog_management::{CatalogError, CatalogManagement};
pub use coupon_management::{CouponManagement, CouponStoreError};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway::{PaymentGateway, PaymentGatewayError};

/// Everything the checkout flow needs from storage.
pub trait CanteenDatabase: OrderManagement + CatalogManagement + CouponManagement {}

impl<T> CanteenDatabase for T where T: OrderManagement + CatalogManagement + CouponManagement {}
