//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go
//! into a separate function. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the backend traits rather than the concrete `PgDatabase`, so the
//! endpoint tests can mount them against mock backends. The server registers them with the
//! concrete type in [`crate::server`].
//!
//! Any long, non-cpu-bound operation (e.g. I/O, database operations) must be awaited, never
//! blocked on, or the worker thread stops processing other requests.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use order_engine::{
    db_types::NewUser,
    AuthApi,
    AuthManagement,
    CatalogApi,
    CatalogManagement,
    OrderFlowApi,
    OrderFlowDatabase,
};

use crate::{
    auth::{hash_password, verify_password, JwtClaims, TokenIssuer},
    config::ServerConfig,
    data_objects::{
        CreateCatalogItemRequest,
        CreateOrderRequest,
        CreateProductRequest,
        JsonResponse,
        LoginRequest,
        PageParams,
        Paginated,
        PaymentStatusRequest,
        RegisterRequest,
        TokenResponse,
        UpdateCatalogItemRequest,
        UpdateOrderRequest,
        UpdateProductRequest,
        UserResponse,
    },
    errors::{AuthError, ServerError},
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------

pub async fn register<B: AuthManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    let password_hash = hash_password(&req.password)?;
    let user = api
        .create_user(NewUser { email: req.email, password_hash, name: req.name, phone_number: req.phone_number })
        .await?;
    debug!("💻️ New user #{} registered", user.id);
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Verifies the email/password pair and issues a fresh access token. The same error is returned
/// for an unknown email and a wrong password.
pub async fn login<B: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let user = api.user_by_email(&req.email).await?.ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(&user.password_hash, &req.password) {
        debug!("💻️ Failed login attempt for {}", user.email);
        return Err(AuthError::InvalidCredentials.into());
    }
    let token = signer.issue_token(&user)?;
    debug!("💻️ Issued access token for user #{}", user.id);
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

pub async fn whoami<B: AuthManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user = api
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("User with id {} not found", claims.sub)))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

//----------------------------------------------  Catalog  ----------------------------------------------------

pub async fn catalog_list<B: CatalogManagement>(
    _claims: JwtClaims,
    req: HttpRequest,
    query: web::Query<PageParams>,
    api: web::Data<CatalogApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let (page, page_size) = query.resolve(config.page_size);
    debug!("💻️ GET catalog page {page}");
    let (items, total) = api.catalog_items(page, page_size).await?;
    Ok(HttpResponse::Ok().json(Paginated::new(items, total, page, page_size, &base_url(&req))))
}

pub async fn catalog_get<B: CatalogManagement>(
    _claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    let item = api
        .catalog_item_by_id(item_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Catalog item with id {item_id} not found")))?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn catalog_create<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<CreateCatalogItemRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    debug!("💻️ POST catalog item by user #{}", claims.sub);
    let item = api.create_catalog_item(req.into()).await?;
    Ok(HttpResponse::Created().json(item))
}

pub async fn catalog_update<B: CatalogManagement>(
    _claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateCatalogItemRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    let item = api.update_catalog_item(path.into_inner(), req.into()).await?;
    Ok(HttpResponse::Ok().json(item))
}

//---------------------------------------------- Products ----------------------------------------------------

pub async fn product_list<B: CatalogManagement>(
    _claims: JwtClaims,
    req: HttpRequest,
    query: web::Query<PageParams>,
    api: web::Data<CatalogApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let (page, page_size) = query.resolve(config.page_size);
    debug!("💻️ GET products page {page}");
    let (items, total) = api.products(page, page_size).await?;
    Ok(HttpResponse::Ok().json(Paginated::new(items, total, page, page_size, &base_url(&req))))
}

pub async fn product_get<B: CatalogManagement>(
    _claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let product = api
        .product_by_id(product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product with id {product_id} not found")))?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn product_create<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<CreateProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    let product = api.create_product(req.into(), Some(claims.sub)).await?;
    debug!("💻️ Product #{} created by user #{}", product.id, claims.sub);
    Ok(HttpResponse::Created().json(product))
}

pub async fn product_update<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    let product = api.update_product(path.into_inner(), req.into(), Some(claims.sub)).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn product_delete<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let product = api.delete_product(product_id, Some(claims.sub)).await?;
    debug!("💻️ Product #{} deleted by user #{}", product.id, claims.sub);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {product_id} deleted"))))
}

pub async fn product_history<B: CatalogManagement>(
    _claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    api.product_by_id(product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product with id {product_id} not found")))?;
    let history = api.history_for_product(product_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------  Orders  ----------------------------------------------------

pub async fn order_create<B: OrderFlowDatabase>(
    claims: JwtClaims,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    debug!("💻️ POST order for user #{}", claims.sub);
    let order = api.create_order(claims.sub, &req.into_items()).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn my_orders<B: OrderFlowDatabase>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user #{}", claims.sub);
    let orders = api.orders_for_user(claims.sub).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn order_get<B: OrderFlowDatabase>(
    _claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let order = api
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order with id {order_id} not found")))?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn order_update<B: OrderFlowDatabase>(
    _claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    let order = api.update_order_items(path.into_inner(), req.into()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Route handler for the payment settlement endpoint.
///
/// The settlement itself (row locking, stock checks, decrements, history) lives in the engine;
/// everything here is translation. The acting user from the access token is recorded in the
/// product history rows the settlement writes.
pub async fn update_payment_status<B: OrderFlowDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<PaymentStatusRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let new_status = body.into_inner().payment_status;
    debug!("💻️ PATCH payment status of order #{order_id} to {new_status} by user #{}", claims.sub);
    let order = api.settle_order(order_id, new_status, claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

fn base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), req.path())
}
