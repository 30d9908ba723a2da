use log::trace;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::db_types::{NewProduct, Product, ProductUpdate};

pub async fn insert_product(product: NewProduct, conn: &mut PgConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (catalog_item_id, sell_price, purchase_price, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(product.catalog_item_id)
    .bind(product.sell_price)
    .bind(product.purchase_price)
    .bind(product.quantity)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut PgConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Fetches one page of products, ordered by id.
pub async fn fetch_products(page: i64, page_size: i64, conn: &mut PgConnection) -> Result<Vec<Product>, sqlx::Error> {
    let offset = (page - 1) * page_size;
    let products = sqlx::query_as("SELECT * FROM products ORDER BY id LIMIT $1 OFFSET $2")
        .bind(page_size)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(products)
}

pub async fn count_products(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(conn).await?;
    Ok(count)
}

/// Fetches the given products under an exclusive row lock, in ascending id order.
///
/// The fixed lock order is what keeps two settlements with overlapping product sets from
/// deadlocking each other. The ids may contain duplicates; each row is returned once.
pub async fn fetch_products_for_update(ids: &[i64], conn: &mut PgConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(ids.to_vec())
        .fetch_all(conn)
        .await?;
    Ok(products)
}

/// Applies a partial update to a product. Returns `None` if the product does not exist.
/// Callers must not pass an empty update; use [`ProductUpdate::normalized_against`] first so that
/// no-change updates never reach this query.
pub async fn update_product(
    product_id: i64,
    update: ProductUpdate,
    conn: &mut PgConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = now(), ");
    let mut set_clause = builder.separated(", ");
    if let Some(catalog_item_id) = update.catalog_item_id {
        set_clause.push("catalog_item_id = ");
        set_clause.push_bind_unseparated(catalog_item_id);
    }
    if let Some(sell_price) = update.sell_price {
        set_clause.push("sell_price = ");
        set_clause.push_bind_unseparated(sell_price);
    }
    if let Some(purchase_price) = update.purchase_price {
        set_clause.push("purchase_price = ");
        set_clause.push_bind_unseparated(purchase_price);
    }
    if let Some(quantity) = update.quantity {
        set_clause.push("quantity = ");
        set_clause.push_bind_unseparated(quantity);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    Ok(product)
}

pub async fn delete_product(product_id: i64, conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(product_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// How many order items reference this product. Used to guard deletion.
pub async fn count_order_items_for_product(product_id: i64, conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE product_id = $1").bind(product_id).fetch_one(conn).await?;
    Ok(count)
}
