use log::trace;
use sqlx::{types::Json, PgConnection};

use crate::db_types::{Product, ProductAction, ProductHistory, ProductSnapshot};

/// Appends an audit record for a product change.
///
/// For `updated` actions the most recent snapshot for the product is fetched and compared
/// field-for-field with the new one; if they are identical the call writes nothing. `created`
/// and `deleted` actions always write. Returns `true` if a row was written.
pub async fn product_changed(
    product: &Product,
    action: ProductAction,
    user_id: Option<i64>,
    conn: &mut PgConnection,
) -> Result<bool, sqlx::Error> {
    let snapshot = product.snapshot();
    if action == ProductAction::Updated {
        if let Some(last) = fetch_latest_snapshot(product.id, &mut *conn).await? {
            if last == snapshot {
                trace!("🗃️ Product #{} is unchanged since its last snapshot. No history written.", product.id);
                return Ok(false);
            }
        }
    }
    sqlx::query(
        r#"
            INSERT INTO product_history (product_id, user_id, action, snapshot)
            VALUES ($1, $2, $3, $4);
        "#,
    )
    .bind(product.id)
    .bind(user_id)
    .bind(action)
    .bind(Json(&snapshot))
    .execute(conn)
    .await?;
    trace!("🗃️ History row ({action}) written for product #{}", product.id);
    Ok(true)
}

/// The most recent snapshot recorded for the product, if any.
async fn fetch_latest_snapshot(
    product_id: i64,
    conn: &mut PgConnection,
) -> Result<Option<ProductSnapshot>, sqlx::Error> {
    let row: Option<(Json<ProductSnapshot>,)> = sqlx::query_as(
        "SELECT snapshot FROM product_history WHERE product_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(Json(snapshot),)| snapshot))
}

/// The full audit trail for a product, newest first.
pub async fn fetch_history_for_product(
    product_id: i64,
    conn: &mut PgConnection,
) -> Result<Vec<ProductHistory>, sqlx::Error> {
    let rows =
        sqlx::query_as("SELECT * FROM product_history WHERE product_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(product_id)
            .fetch_all(conn)
            .await?;
    Ok(rows)
}
