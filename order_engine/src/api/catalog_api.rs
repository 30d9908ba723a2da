//! Unified API for catalog and product access.
use std::fmt::Debug;

use crate::{
    db_types::{
        CatalogItem,
        CatalogItemUpdate,
        NewCatalogItem,
        NewProduct,
        Product,
        ProductHistory,
        ProductUpdate,
    },
    traits::{CatalogApiError, CatalogManagement},
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn catalog_items(&self, page: i64, page_size: i64) -> Result<(Vec<CatalogItem>, i64), CatalogApiError> {
        self.db.fetch_catalog_items(page, page_size).await
    }

    pub async fn catalog_item_by_id(&self, item_id: i64) -> Result<Option<CatalogItem>, CatalogApiError> {
        self.db.fetch_catalog_item(item_id).await
    }

    pub async fn create_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError> {
        self.db.create_catalog_item(item).await
    }

    pub async fn update_catalog_item(
        &self,
        item_id: i64,
        update: CatalogItemUpdate,
    ) -> Result<CatalogItem, CatalogApiError> {
        self.db.update_catalog_item(item_id, update).await
    }

    pub async fn products(&self, page: i64, page_size: i64) -> Result<(Vec<Product>, i64), CatalogApiError> {
        self.db.fetch_products(page, page_size).await
    }

    pub async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        self.db.fetch_product(product_id).await
    }

    pub async fn create_product(
        &self,
        product: NewProduct,
        acting_user: Option<i64>,
    ) -> Result<Product, CatalogApiError> {
        self.db.create_product(product, acting_user).await
    }

    pub async fn update_product(
        &self,
        product_id: i64,
        update: ProductUpdate,
        acting_user: Option<i64>,
    ) -> Result<Product, CatalogApiError> {
        self.db.update_product(product_id, update, acting_user).await
    }

    pub async fn delete_product(&self, product_id: i64, acting_user: Option<i64>) -> Result<Product, CatalogApiError> {
        self.db.delete_product(product_id, acting_user).await
    }

    pub async fn history_for_product(&self, product_id: i64) -> Result<Vec<ProductHistory>, CatalogApiError> {
        self.db.fetch_product_history(product_id).await
    }
}
