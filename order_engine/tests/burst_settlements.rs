//! Concurrent settlement tests.
//!
//! Independent tasks race to settle orders backed by the same product. The row locks taken by the
//! settlement transaction are what keeps the stock from being oversold; these tests fail loudly
//! if the locking is ever weakened. Requires `OMS_TEST_DATABASE_URL` (see `support`).
mod support;

use log::*;
use oms_common::Money;
use order_engine::{
    db_types::{NewOrderItem, PaymentStatus},
    traits::OrderFlowError,
    CatalogManagement,
    OrderFlowDatabase,
};
use tokio::runtime::Runtime;

use crate::support::{prepare_test_env, seed_product, seed_user};

const NUM_ORDERS: i64 = 12;
const STOCK: i64 = 5;

#[test]
fn burst_settlements() {
    let sys = Runtime::new().unwrap();

    sys.block_on(async move {
        let Some(db) = prepare_test_env().await else { return };
        let user = seed_user(&db).await;
        let product = seed_product(&db, Money::from_whole(25), STOCK).await;

        info!("🚀️ Creating {NUM_ORDERS} orders against a stock of {STOCK}");
        let mut order_ids = Vec::new();
        for _ in 0..NUM_ORDERS {
            let order = db
                .create_order(user.id, &[NewOrderItem { product_id: product.id, quantity: 1 }])
                .await
                .expect("Error creating order");
            order_ids.push(order.order.id);
        }

        info!("🚀️ Settling {NUM_ORDERS} orders concurrently");
        let mut tasks = Vec::new();
        for order_id in order_ids {
            let db = db.clone();
            let user_id = user.id;
            tasks.push(tokio::spawn(async move {
                db.settle_order(order_id, PaymentStatus::Paid, user_id).await
            }));
        }

        let mut paid = 0;
        let mut rejected = 0;
        for task in tasks {
            match task.await.expect("settlement task panicked") {
                Ok(order) => {
                    assert_eq!(order.order.payment_status, PaymentStatus::Paid);
                    paid += 1;
                },
                Err(OrderFlowError::InsufficientStock(id)) => {
                    assert_eq!(id, product.id);
                    rejected += 1;
                },
                Err(e) => panic!("Unexpected settlement error: {e}"),
            }
        }
        assert_eq!(paid, STOCK);
        assert_eq!(rejected, NUM_ORDERS - STOCK);

        let product = db.fetch_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
        info!("🚀️ Burst complete: {paid} settled, {rejected} rejected, stock is {}", product.quantity);
    });
}

#[test]
fn two_settlements_one_winner() {
    let sys = Runtime::new().unwrap();

    sys.block_on(async move {
        let Some(db) = prepare_test_env().await else { return };
        let user = seed_user(&db).await;
        let product = seed_product(&db, Money::from_whole(25), 5).await;

        // Two orders for 3 units each; the stock covers only one of them.
        let first = db
            .create_order(user.id, &[NewOrderItem { product_id: product.id, quantity: 3 }])
            .await
            .unwrap();
        let second = db
            .create_order(user.id, &[NewOrderItem { product_id: product.id, quantity: 3 }])
            .await
            .unwrap();

        let (a, b) = {
            let db_a = db.clone();
            let db_b = db.clone();
            let user_id = user.id;
            let ta = tokio::spawn(async move {
                db_a.settle_order(first.order.id, PaymentStatus::Paid, user_id).await
            });
            let tb = tokio::spawn(async move {
                db_b.settle_order(second.order.id, PaymentStatus::Paid, user_id).await
            });
            (ta.await.unwrap(), tb.await.unwrap())
        };

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one of two competing settlements may win");
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser.unwrap_err(), OrderFlowError::InsufficientStock(id) if id == product.id));

        let product = db.fetch_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 2);
    });
}
