use log::debug;
use oms_common::Money;
use sqlx::PgConnection;

use crate::{
    db_types::{Order, OrderItem, PaymentStatus},
    traits::OrderFlowError,
};

pub async fn insert_order(user_id: i64, conn: &mut PgConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as("INSERT INTO orders (user_id) VALUES ($1) RETURNING *")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the order under an exclusive row lock. The lock must be taken before any stock check
/// so that a concurrent settlement of the same order blocks here until the first one commits or
/// rolls back.
pub async fn fetch_order_for_update(order_id: i64, conn: &mut PgConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut PgConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut PgConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Inserts a line item, capturing `price` as the product's sell price at this moment. The price
/// is never recomputed afterwards.
pub async fn insert_order_item(
    order_id: i64,
    product_id: i64,
    quantity: i64,
    price: Money,
    conn: &mut PgConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn update_order_item_quantity(
    item_id: i64,
    quantity: i64,
    conn: &mut PgConnection,
) -> Result<Option<OrderItem>, sqlx::Error> {
    let item = sqlx::query_as(
        "UPDATE order_items SET quantity = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(quantity)
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

pub async fn delete_order_item(item_id: i64, conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM order_items WHERE id = $1").bind(item_id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub(crate) async fn update_payment_status(
    order_id: i64,
    status: PaymentStatus,
    conn: &mut PgConnection,
) -> Result<Order, OrderFlowError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET payment_status = $1, updated_at = now() WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    debug!("🗃️ Order #{order_id} payment status set to {status}");
    result.ok_or(OrderFlowError::OrderNotFound(order_id))
}
