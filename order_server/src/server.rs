use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AuthApi,
    CatalogApi,
    OrderFlowApi,
    PgDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        catalog_create,
        catalog_get,
        catalog_list,
        catalog_update,
        health,
        login,
        my_orders,
        order_create,
        order_get,
        order_update,
        product_create,
        product_delete,
        product_get,
        product_history,
        product_list,
        product_update,
        register,
        update_payment_status,
        whoami,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = PgDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.migrate_on_start {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }

    let mut hooks = EventHooks::default();
    hooks.on_order_settled(|event| {
        Box::pin(async move {
            info!("📬️ Order #{} settled. Payment status is now {}", event.order.id, event.order.payment_status);
        })
    });
    let handlers = EventHandlers::new(128, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: PgDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let auth_api = AuthApi::new(db.clone());
        let signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("oms::access_log"))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(signer))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler));
        let auth_scope = web::scope("/auth")
            .route("/register", web::post().to(register::<PgDatabase>))
            .route("/login", web::post().to(login::<PgDatabase>))
            .route("/me", web::get().to(whoami::<PgDatabase>));
        // Routes that require authentication enforce it via the JwtClaims extractor.
        let api_scope = web::scope("/api")
            .route("/catalog", web::get().to(catalog_list::<PgDatabase>))
            .route("/catalog", web::post().to(catalog_create::<PgDatabase>))
            .route("/catalog/{item_id}", web::get().to(catalog_get::<PgDatabase>))
            .route("/catalog/{item_id}", web::patch().to(catalog_update::<PgDatabase>))
            .route("/products", web::get().to(product_list::<PgDatabase>))
            .route("/products", web::post().to(product_create::<PgDatabase>))
            .route("/products/{product_id}", web::get().to(product_get::<PgDatabase>))
            .route("/products/{product_id}", web::patch().to(product_update::<PgDatabase>))
            .route("/products/{product_id}", web::delete().to(product_delete::<PgDatabase>))
            .route("/products/{product_id}/history", web::get().to(product_history::<PgDatabase>))
            .route("/orders", web::get().to(my_orders::<PgDatabase>))
            .route("/orders", web::post().to(order_create::<PgDatabase>))
            .route("/orders/{order_id}", web::get().to(order_get::<PgDatabase>))
            .route("/orders/{order_id}", web::patch().to(order_update::<PgDatabase>))
            .route("/orders/{order_id}/payment-status", web::patch().to(update_payment_status::<PgDatabase>));
        app.service(health).service(auth_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Malformed JSON payloads (including unknown enum values) surface as 422, not actix's default
/// 400, so callers can tell a payload problem from a domain rule violation.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not deserialize request body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not parse request path. {err}");
    ServerError::InvalidRequestPath(err.to_string()).into()
}
