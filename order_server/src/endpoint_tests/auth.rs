use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use order_engine::{db_types::User, AuthApi};
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::MockAuthBackend,
};
use crate::{
    auth::hash_password,
    routes::{login, whoami},
};

fn stored_user(password: &str) -> User {
    User {
        id: 1,
        email: "alice@example.com".to_string(),
        password_hash: hash_password(password).unwrap(),
        name: Some("Alice".to_string()),
        phone_number: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn mount_auth(cfg: &mut ServiceConfig, backend: MockAuthBackend) {
    cfg.app_data(web::Data::new(AuthApi::new(backend)))
        .route("/auth/login", web::post().to(login::<MockAuthBackend>))
        .route("/auth/me", web::get().to(whoami::<MockAuthBackend>));
}

#[actix_web::test]
async fn login_issues_a_token() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockAuthBackend::new();
        backend.expect_fetch_user_by_email().returning(|_| Ok(Some(stored_user("correct horse"))));
        mount_auth(cfg, backend);
    }
    let (status, body) = post_request(
        "",
        "/auth/login",
        json!({"email": "alice@example.com", "password": "correct horse"}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["token_type"], "bearer");
    assert!(!response["access_token"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn wrong_password_is_rejected() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockAuthBackend::new();
        backend.expect_fetch_user_by_email().returning(|_| Ok(Some(stored_user("correct horse"))));
        mount_auth(cfg, backend);
    }
    let (status, _) = post_request(
        "",
        "/auth/login",
        json!({"email": "alice@example.com", "password": "battery staple"}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unknown_emails_get_the_same_rejection() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockAuthBackend::new();
        backend.expect_fetch_user_by_email().returning(|_| Ok(None));
        mount_auth(cfg, backend);
    }
    let (status, body) = post_request(
        "",
        "/auth/login",
        json!({"email": "nobody@example.com", "password": "whatever!"}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid email or password"));
}

#[actix_web::test]
async fn whoami_resolves_the_token_subject() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut backend = MockAuthBackend::new();
        backend.expect_fetch_user().returning(|user_id| {
            assert_eq!(user_id, 1);
            Ok(Some(stored_user("correct horse")))
        });
        mount_auth(cfg, backend);
    }
    let token = issue_token(1, "alice@example.com");
    let (status, body) = get_request(&token, "/auth/me", configure).await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["email"], "alice@example.com");
    assert!(response.get("password_hash").is_none());
}
