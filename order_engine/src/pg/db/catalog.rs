use log::trace;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::db_types::{CatalogItem, CatalogItemUpdate, NewCatalogItem};

pub async fn insert_catalog_item(
    item: NewCatalogItem,
    conn: &mut PgConnection,
) -> Result<CatalogItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO catalog_items (name, description)
            VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(item.name)
    .bind(item.description)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_catalog_item(item_id: i64, conn: &mut PgConnection) -> Result<Option<CatalogItem>, sqlx::Error> {
    let item =
        sqlx::query_as("SELECT * FROM catalog_items WHERE id = $1").bind(item_id).fetch_optional(conn).await?;
    Ok(item)
}

/// Fetches one page of catalog items, ordered by id.
pub async fn fetch_catalog_items(
    page: i64,
    page_size: i64,
    conn: &mut PgConnection,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let offset = (page - 1) * page_size;
    let items = sqlx::query_as("SELECT * FROM catalog_items ORDER BY id LIMIT $1 OFFSET $2")
        .bind(page_size)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn count_catalog_items(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM catalog_items").fetch_one(conn).await?;
    Ok(count)
}

/// Applies a partial update to a catalog item. Returns `None` if the item does not exist.
/// Callers must not pass an empty update.
pub async fn update_catalog_item(
    item_id: i64,
    update: CatalogItemUpdate,
    conn: &mut PgConnection,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE catalog_items SET updated_at = now(), ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(item_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let item = builder.build_query_as::<CatalogItem>().fetch_optional(conn).await?;
    Ok(item)
}
