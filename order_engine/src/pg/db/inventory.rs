//! The inventory ledger: the sole authority for validating and applying stock-quantity changes.
//!
//! Both entry points assume the caller already holds row locks on the affected products (see
//! [`super::products::fetch_products_for_update`]); the check is only meaningful under lock.
use log::debug;
use sqlx::PgConnection;

use super::{history, products};
use crate::{
    db_types::{OrderItem, Product, ProductAction},
    traits::OrderFlowError,
};

/// Validates that every order item can be satisfied from the on-hand quantity of its product.
/// Fails fast on the first shortfall, naming the offending product.
pub fn check_stock_levels(items: &[OrderItem], stock: &[Product]) -> Result<(), OrderFlowError> {
    for item in items {
        let product = stock
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
        if item.quantity > product.quantity {
            return Err(OrderFlowError::InsufficientStock(product.id));
        }
    }
    Ok(())
}

/// Reduces a product's on-hand quantity by `by`, re-validating that the result stays
/// non-negative inside the UPDATE itself. An earlier stock check can be stale by the time the
/// decrement runs, so the guard in the WHERE clause is what actually upholds the invariant.
///
/// On success the history recorder is triggered with action `updated` on the same connection, so
/// the audit row commits or rolls back together with the decrement.
pub async fn decrement_stock(
    product_id: i64,
    by: i64,
    acting_user: Option<i64>,
    conn: &mut PgConnection,
) -> Result<Product, OrderFlowError> {
    let updated: Option<Product> = sqlx::query_as(
        r#"
            UPDATE products SET quantity = quantity - $2, updated_at = now()
            WHERE id = $1 AND quantity >= $2
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .bind(by)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(product) => {
            debug!("🗃️ Stock for product #{product_id} reduced by {by} to {}", product.quantity);
            history::product_changed(&product, ProductAction::Updated, acting_user, conn).await?;
            Ok(product)
        },
        None => match products::fetch_product(product_id, conn).await? {
            Some(_) => Err(OrderFlowError::InsufficientStock(product_id)),
            None => Err(OrderFlowError::ProductNotFound(product_id)),
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use oms_common::Money;

    use super::check_stock_levels;
    use crate::{
        db_types::{OrderItem, Product},
        traits::OrderFlowError,
    };

    fn product(id: i64, quantity: i64) -> Product {
        Product {
            id,
            catalog_item_id: 1,
            sell_price: Money::from_whole(10),
            purchase_price: Money::from_whole(5),
            quantity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(product_id: i64, quantity: i64) -> OrderItem {
        OrderItem {
            id: product_id * 100,
            order_id: 1,
            product_id,
            quantity,
            price: Money::from_whole(10),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sufficient_stock_passes() {
        let stock = vec![product(1, 5), product(2, 1)];
        let items = vec![item(1, 5), item(2, 1)];
        assert!(check_stock_levels(&items, &stock).is_ok());
    }

    #[test]
    fn shortfall_names_the_offending_product() {
        let stock = vec![product(1, 5), product(2, 1)];
        let items = vec![item(1, 2), item(2, 3)];
        let err = check_stock_levels(&items, &stock).unwrap_err();
        assert!(matches!(err, OrderFlowError::InsufficientStock(2)));
    }

    #[test]
    fn missing_product_is_reported() {
        let stock = vec![product(1, 5)];
        let items = vec![item(9, 1)];
        let err = check_stock_levels(&items, &stock).unwrap_err();
        assert!(matches!(err, OrderFlowError::ProductNotFound(9)));
    }
}
