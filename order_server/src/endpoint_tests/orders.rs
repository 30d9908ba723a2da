use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use oms_common::Money;
use order_engine::{
    db_types::{Order, OrderDetail, OrderItem, PaymentStatus},
    events::EventProducers,
    traits::OrderFlowError,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, patch_request, post_request},
    mocks::MockOrderFlowBackend,
};
use crate::routes::{order_create, order_get, order_update, update_payment_status};

fn order_detail(status: PaymentStatus) -> OrderDetail {
    let at = Utc.with_ymd_and_hms(2024, 6, 10, 13, 30, 0).unwrap();
    OrderDetail {
        order: Order { id: 10, user_id: 1, payment_status: status, created_at: at, updated_at: at },
        items: vec![OrderItem {
            id: 100,
            order_id: 10,
            product_id: 7,
            quantity: 2,
            price: Money::from_whole(100),
            created_at: at,
            updated_at: at,
        }],
    }
}

fn mount_orders(cfg: &mut ServiceConfig, backend: MockOrderFlowBackend) {
    let api = OrderFlowApi::new(backend, EventProducers::default());
    cfg.app_data(web::Data::new(api))
        .route("/orders", web::post().to(order_create::<MockOrderFlowBackend>))
        .route("/orders/{order_id}", web::get().to(order_get::<MockOrderFlowBackend>))
        .route("/orders/{order_id}", web::patch().to(order_update::<MockOrderFlowBackend>))
        .route("/orders/{order_id}/payment-status", web::patch().to(update_payment_status::<MockOrderFlowBackend>));
}

#[actix_web::test]
async fn create_order_requires_a_token() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        mount_orders(cfg, MockOrderFlowBackend::new());
    }
    let (status, body) =
        post_request("", "/orders", json!({"items": [{"product_id": 7, "quantity": 2}]}), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"));
}

#[actix_web::test]
async fn create_order_returns_201() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockOrderFlowBackend::new();
        backend.expect_create_order().returning(|user_id, items| {
            assert_eq!(user_id, 1);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].product_id, 7);
            Ok(order_detail(PaymentStatus::Unpaid))
        });
        mount_orders(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, body) =
        post_request(&token, "/orders", json!({"items": [{"product_id": 7, "quantity": 2}]}), configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["id"], 10);
    assert_eq!(response["payment_status"], "unpaid");
    assert_eq!(response["items"][0]["product_id"], 7);
}

#[actix_web::test]
async fn empty_orders_are_rejected() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        mount_orders(cfg, MockOrderFlowBackend::new());
    }
    let token = issue_token(1, "alice@example.com");
    let (status, _) = post_request(&token, "/orders", json!({"items": []}), configure).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn missing_orders_return_404() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockOrderFlowBackend::new();
        backend.expect_fetch_order_detail().returning(|_| Ok(None));
        mount_orders(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, body) = get_request(&token, "/orders/999", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("999"));
}

#[actix_web::test]
async fn settlement_returns_the_paid_order() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockOrderFlowBackend::new();
        backend.expect_settle_order().returning(|order_id, new_status, acting_user| {
            assert_eq!(order_id, 10);
            assert_eq!(new_status, PaymentStatus::Paid);
            assert_eq!(acting_user, 1);
            Ok(order_detail(PaymentStatus::Paid))
        });
        mount_orders(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, body) =
        patch_request(&token, "/orders/10/payment-status", json!({"payment_status": "paid"}), configure).await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["payment_status"], "paid");
}

#[actix_web::test]
async fn insufficient_stock_maps_to_400() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockOrderFlowBackend::new();
        backend.expect_settle_order().returning(|_, _, _| Err(OrderFlowError::InsufficientStock(7)));
        mount_orders(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, body) =
        patch_request(&token, "/orders/10/payment-status", json!({"payment_status": "paid"}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Insufficient stock"));
    assert!(body.contains('7'));
}

#[actix_web::test]
async fn unknown_payment_status_maps_to_422() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        // Deserialization fails before the backend is ever consulted.
        mount_orders(cfg, MockOrderFlowBackend::new());
    }
    let token = issue_token(1, "alice@example.com");
    let (status, _) =
        patch_request(&token, "/orders/10/payment-status", json!({"payment_status": "unknown"}), configure).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn resettling_a_paid_order_maps_to_409() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockOrderFlowBackend::new();
        backend.expect_settle_order().returning(|order_id, _, _| {
            Err(OrderFlowError::PaymentStatusImmutable { order_id, status: PaymentStatus::Paid })
        });
        mount_orders(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, _) =
        patch_request(&token, "/orders/10/payment-status", json!({"payment_status": "paid"}), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn order_update_passes_the_change_set_through() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockOrderFlowBackend::new();
        backend.expect_update_order_items().returning(|order_id, changes| {
            assert_eq!(order_id, 10);
            assert_eq!(changes.delete_item_ids, vec![100]);
            assert!(changes.update_items.is_empty());
            assert_eq!(changes.new_items.len(), 1);
            Ok(order_detail(PaymentStatus::Unpaid))
        });
        mount_orders(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, _) = patch_request(
        &token,
        "/orders/10",
        json!({"delete_item_ids": [100], "new_items": [{"product_id": 7, "quantity": 3}]}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
