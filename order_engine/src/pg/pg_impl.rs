//! `PgDatabase` is the Postgres implementation of the order management backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module. Every multi-step
//! operation runs inside a single transaction obtained from the connection pool, so a failure in
//! any step leaves no partial state behind.
use std::{collections::HashSet, fmt::Debug};

use log::*;
use sqlx::PgPool;

use super::db::{catalog, db_url, history, inventory, new_pool, orders, products, users};
use crate::{
    db_types::{
        CatalogItem,
        CatalogItemUpdate,
        NewCatalogItem,
        NewOrderItem,
        NewProduct,
        NewUser,
        Order,
        OrderDetail,
        OrderItemChanges,
        PaymentStatus,
        Product,
        ProductAction,
        ProductHistory,
        ProductUpdate,
        User,
    },
    traits::{
        AuthApiError,
        AuthManagement,
        CatalogApiError,
        CatalogManagement,
        OrderFlowDatabase,
        OrderFlowError,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct PgDatabase {
    url: String,
    pool: PgPool,
}

impl Debug for PgDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PgDatabase ({:?})", self.pool)
    }
}

impl PgDatabase {
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        super::db::run_migrations(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Ensures the catalog item exists, for use inside product create/update transactions.
    async fn require_catalog_item(
        item_id: i64,
        conn: &mut sqlx::PgConnection,
    ) -> Result<CatalogItem, CatalogApiError> {
        catalog::fetch_catalog_item(item_id, conn).await?.ok_or(CatalogApiError::CatalogItemNotFound(item_id))
    }
}

impl CatalogManagement for PgDatabase {
    async fn fetch_catalog_items(&self, page: i64, page_size: i64) -> Result<(Vec<CatalogItem>, i64), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = catalog::fetch_catalog_items(page, page_size, &mut conn).await?;
        let total = catalog::count_catalog_items(&mut conn).await?;
        Ok((items, total))
    }

    async fn fetch_catalog_item(&self, item_id: i64) -> Result<Option<CatalogItem>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let item = catalog::fetch_catalog_item(item_id, &mut conn).await?;
        Ok(item)
    }

    async fn create_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let item = catalog::insert_catalog_item(item, &mut conn).await?;
        debug!("🗃️ Catalog item #{} ({}) created", item.id, item.name);
        Ok(item)
    }

    async fn update_catalog_item(
        &self,
        item_id: i64,
        update: CatalogItemUpdate,
    ) -> Result<CatalogItem, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        if update.is_empty() {
            return catalog::fetch_catalog_item(item_id, &mut conn)
                .await?
                .ok_or(CatalogApiError::CatalogItemNotFound(item_id));
        }
        catalog::update_catalog_item(item_id, update, &mut conn)
            .await?
            .ok_or(CatalogApiError::CatalogItemNotFound(item_id))
    }

    async fn fetch_products(&self, page: i64, page_size: i64) -> Result<(Vec<Product>, i64), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = products::fetch_products(page, page_size, &mut conn).await?;
        let total = products::count_products(&mut conn).await?;
        Ok((items, total))
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn create_product(&self, product: NewProduct, acting_user: Option<i64>) -> Result<Product, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        Self::require_catalog_item(product.catalog_item_id, &mut tx).await?;
        let product = products::insert_product(product, &mut tx).await?;
        history::product_changed(&product, ProductAction::Created, acting_user, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product #{} created under catalog item #{}", product.id, product.catalog_item_id);
        Ok(product)
    }

    async fn update_product(
        &self,
        product_id: i64,
        update: ProductUpdate,
        acting_user: Option<i64>,
    ) -> Result<Product, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let current =
            products::fetch_product(product_id, &mut tx).await?.ok_or(CatalogApiError::ProductNotFound(product_id))?;
        if let Some(catalog_item_id) = update.catalog_item_id {
            Self::require_catalog_item(catalog_item_id, &mut tx).await?;
        }
        // A field set to its current value must not bump updated_at, or the history dedup below
        // would see a "change" that isn't one.
        let update = update.normalized_against(&current);
        if update.is_empty() {
            tx.commit().await?;
            return Ok(current);
        }
        let updated = products::update_product(product_id, update, &mut tx)
            .await?
            .ok_or(CatalogApiError::ProductNotFound(product_id))?;
        history::product_changed(&updated, ProductAction::Updated, acting_user, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product #{product_id} updated");
        Ok(updated)
    }

    async fn delete_product(&self, product_id: i64, acting_user: Option<i64>) -> Result<Product, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let product =
            products::fetch_product(product_id, &mut tx).await?.ok_or(CatalogApiError::ProductNotFound(product_id))?;
        let references = products::count_order_items_for_product(product_id, &mut tx).await?;
        if references > 0 {
            return Err(CatalogApiError::ProductInUse(product_id));
        }
        // The deleted snapshot is written first; the foreign key nulls out product_id when the
        // row goes away, and the record itself survives.
        history::product_changed(&product, ProductAction::Deleted, acting_user, &mut tx).await?;
        products::delete_product(product_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product #{product_id} deleted");
        Ok(product)
    }

    async fn fetch_product_history(&self, product_id: i64) -> Result<Vec<ProductHistory>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let rows = history::fetch_history_for_product(product_id, &mut conn).await?;
        Ok(rows)
    }
}

impl OrderManagement for PgDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderDetail>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = orders::fetch_order_items(order.id, &mut conn).await?;
            result.push(OrderDetail { order, items });
        }
        Ok(result)
    }
}

impl OrderFlowDatabase for PgDatabase {
    async fn create_order(&self, user_id: i64, items: &[NewOrderItem]) -> Result<OrderDetail, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(user_id, &mut tx).await?;
        for line in items {
            let product = products::fetch_product(line.product_id, &mut tx)
                .await?
                .ok_or(OrderFlowError::ProductNotFound(line.product_id))?;
            orders::insert_order_item(order.id, product.id, line.quantity, product.sell_price, &mut tx).await?;
        }
        let items = orders::fetch_order_items(order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} created for user #{user_id} with {} items", order.id, items.len());
        Ok(OrderDetail { order, items })
    }

    async fn update_order_items(
        &self,
        order_id: i64,
        changes: OrderItemChanges,
    ) -> Result<OrderDetail, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let existing = orders::fetch_order_items(order_id, &mut tx).await?;
        let mut member_ids: HashSet<i64> = existing.iter().map(|i| i.id).collect();
        // Unknown ids in the delete list are ignored, so callers can retry a change set that has
        // already partially landed.
        for item_id in &changes.delete_item_ids {
            if member_ids.remove(item_id) {
                orders::delete_order_item(*item_id, &mut tx).await?;
            } else {
                trace!("🗃️ Delete of item #{item_id} skipped; not part of order #{order_id}");
            }
        }
        for update in &changes.update_items {
            if !member_ids.contains(&update.item_id) {
                return Err(OrderFlowError::OrderItemNotFound { item_id: update.item_id, order_id });
            }
            orders::update_order_item_quantity(update.item_id, update.quantity, &mut tx)
                .await?
                .ok_or(OrderFlowError::OrderItemNotFound { item_id: update.item_id, order_id })?;
        }
        for line in &changes.new_items {
            let product = products::fetch_product(line.product_id, &mut tx)
                .await?
                .ok_or(OrderFlowError::ProductNotFound(line.product_id))?;
            orders::insert_order_item(order_id, product.id, line.quantity, product.sell_price, &mut tx).await?;
        }
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} items updated; now {} items", items.len());
        Ok(OrderDetail { order, items })
    }

    async fn settle_order(
        &self,
        order_id: i64,
        new_status: PaymentStatus,
        acting_user: i64,
    ) -> Result<OrderDetail, OrderFlowError> {
        if new_status == PaymentStatus::Unpaid {
            return Err(OrderFlowError::PaymentStatusNoOp);
        }
        let mut tx = self.pool.begin().await?;
        // The order row lock must come before any stock check; a concurrent settlement of the
        // same order parks here and re-reads current quantities once we are done.
        let order =
            orders::fetch_order_for_update(order_id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.payment_status != PaymentStatus::Unpaid {
            return Err(OrderFlowError::PaymentStatusImmutable { order_id, status: order.payment_status });
        }
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        if new_status == PaymentStatus::Paid {
            let mut product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
            product_ids.sort_unstable();
            product_ids.dedup();
            let stock = products::fetch_products_for_update(&product_ids, &mut tx).await?;
            inventory::check_stock_levels(&items, &stock)?;
            for item in &items {
                inventory::decrement_stock(item.product_id, item.quantity, Some(acting_user), &mut tx).await?;
            }
        }
        let order = orders::update_payment_status(order_id, new_status, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} settled as {new_status} by user #{acting_user}");
        Ok(OrderDetail { order, items })
    }
}

impl AuthManagement for PgDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(user, &mut conn).await?;
        debug!("🗃️ User #{} ({}) created", user.id, user.email);
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }
}
