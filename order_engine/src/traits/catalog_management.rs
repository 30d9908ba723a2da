use thiserror::Error;

use crate::db_types::{
    CatalogItem,
    CatalogItemUpdate,
    NewCatalogItem,
    NewProduct,
    Product,
    ProductHistory,
    ProductUpdate,
};

/// Catalog and product management behaviour.
///
/// Product mutations carry the acting user id (if known) so that the audit trail can attribute
/// the change. Every mutating call writes its history record inside the same transaction as the
/// change itself.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn fetch_catalog_items(&self, page: i64, page_size: i64) -> Result<(Vec<CatalogItem>, i64), CatalogApiError>;

    async fn fetch_catalog_item(&self, item_id: i64) -> Result<Option<CatalogItem>, CatalogApiError>;

    async fn create_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError>;

    /// Applies a partial update. An empty update returns the current row unchanged.
    async fn update_catalog_item(&self, item_id: i64, update: CatalogItemUpdate)
        -> Result<CatalogItem, CatalogApiError>;

    async fn fetch_products(&self, page: i64, page_size: i64) -> Result<(Vec<Product>, i64), CatalogApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;

    /// Creates a product under an existing catalog item and records a `created` history row.
    async fn create_product(&self, product: NewProduct, acting_user: Option<i64>) -> Result<Product, CatalogApiError>;

    /// Applies a partial update and records an `updated` history row, unless the update leaves
    /// the product unchanged, in which case no history is written.
    async fn update_product(
        &self,
        product_id: i64,
        update: ProductUpdate,
        acting_user: Option<i64>,
    ) -> Result<Product, CatalogApiError>;

    /// Deletes a product that no order item references, recording a `deleted` history row first.
    async fn delete_product(&self, product_id: i64, acting_user: Option<i64>) -> Result<Product, CatalogApiError>;

    /// The audit trail for a product, newest first.
    async fn fetch_product_history(&self, product_id: i64) -> Result<Vec<ProductHistory>, CatalogApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Catalog item with id {0} not found")]
    CatalogItemNotFound(i64),
    #[error("Product with id {0} not found")]
    ProductNotFound(i64),
    #[error("Product with id {0} is referenced by order items and cannot be deleted")]
    ProductInUse(i64),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}
