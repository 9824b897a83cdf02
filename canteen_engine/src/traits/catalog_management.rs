use thiserror::Error;

use crate::db_types::{FoodItem, NewFoodItem};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Food item {0} does not exist")]
    FoodItemNotFound(i64),
    #[error("Invalid food item: {0}")]
    InvalidFoodItem(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Read access to menu items, plus the handful of writes needed to maintain the menu.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches the food items with the given ids. Unknown ids are silently absent from the result.
    async fn fetch_food_items(&self, ids: &[i64]) -> Result<Vec<FoodItem>, CatalogError>;

    async fn insert_food_item(&self, item: NewFoodItem) -> Result<FoodItem, CatalogError>;

    async fn set_food_item_availability(&self, id: i64, available: bool) -> Result<FoodItem, CatalogError>;
}
