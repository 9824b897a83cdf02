use log::*;

use crate::{
    db_types::Order,
    order_objects::{Identity, OrderQueryFilter},
    traits::OrderManagement,
    OrderQueryError,
};

/// Read access to orders. Users see their own orders; administrators see everything.
pub struct OrdersApi<B> {
    db: B,
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Fetches a single order. Someone else's order is reported as not found, so its existence is not revealed.
    pub async fn fetch_order(&self, id: i64, identity: &Identity) -> Result<Order, OrderQueryError> {
        match self.db.fetch_order_by_id(id).await? {
            Some(order) if identity.is_admin || order.is_owned_by(&identity.user_id) => Ok(order),
            Some(order) => {
                warn!("📋️ {} asked for order {} belonging to {}", identity.user_id, order.order_number, order.user_id);
                Err(OrderQueryError::OrderNotFound(id))
            },
            None => Err(OrderQueryError::OrderNotFound(id)),
        }
    }

    /// Orders matching `query`, newest first. For non-admins the query is always narrowed to their own orders,
    /// whatever user filter they asked for.
    pub async fn search_orders(
        &self,
        query: OrderQueryFilter,
        identity: &Identity,
    ) -> Result<Vec<Order>, OrderQueryError> {
        let query = if identity.is_admin { query } else { query.with_user_id(identity.user_id.as_str()) };
        trace!("📋️ Order search for {}: {query:?}", identity.user_id);
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }
}
