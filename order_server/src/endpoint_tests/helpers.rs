use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, Utc};
use oms_common::Secret;
use order_engine::db_types::User;

use crate::{
    auth::TokenIssuer,
    config::{AuthConfig, ServerConfig},
    server::{json_error_handler, path_error_handler},
};

/// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-test-secret-do-not-reuse".to_string()),
        token_expiry: Duration::hours(1),
    }
}

pub fn issue_token(user_id: i64, email: &str) -> String {
    let issuer = TokenIssuer::new(&get_auth_config());
    let user = User {
        id: user_id,
        email: email.to_string(),
        password_hash: String::new(),
        name: None,
        phone_number: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    issuer.issue_token(&user).expect("Failed to sign token")
}

pub async fn get_request(token: &str, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = TestRequest::get().uri(path);
    send_request(req, token, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::post().uri(path).set_json(body);
    send_request(req, token, configure).await
}

pub async fn patch_request(
    token: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::patch().uri(path).set_json(body);
    send_request(req, token, configure).await
}

async fn send_request(
    mut req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let app = App::new()
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .app_data(web::Data::new(ServerConfig::new("127.0.0.1", 0)))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
