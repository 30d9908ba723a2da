//! Request and response payloads for the HTTP surface.
//!
//! Each inbound payload carries a `validate()` method enforcing the domain's value rules
//! (non-empty order, positive quantities, field length caps). Validation failures surface as
//! 422 responses before any engine call is made.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use oms_common::Money;
use order_engine::db_types::{
    CatalogItemUpdate,
    NewCatalogItem,
    NewOrderItem,
    NewProduct,
    OrderItemChanges,
    OrderItemQuantityUpdate,
    PaymentStatus,
    ProductUpdate,
    User,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Auth   ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        if !self.email.contains('@') || self.email.len() > MAX_NAME_LEN {
            return Err(ServerError::InvalidRequestBody("email is not a valid address".into()));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(ServerError::InvalidRequestBody(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer".to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone_number: user.phone_number,
            created_at: user.created_at,
        }
    }
}

//----------------------------------------------  Catalog  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCatalogItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateCatalogItemRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        validate_name(&self.name)?;
        validate_description(self.description.as_deref())
    }
}

impl From<CreateCatalogItemRequest> for NewCatalogItem {
    fn from(req: CreateCatalogItemRequest) -> Self {
        Self { name: req.name, description: req.description }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCatalogItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateCatalogItemRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_description(self.description.as_deref())
    }
}

impl From<UpdateCatalogItemRequest> for CatalogItemUpdate {
    fn from(req: UpdateCatalogItemRequest) -> Self {
        Self { name: req.name, description: req.description }
    }
}

//---------------------------------------------- Products ----------------------------------------------------

/// Prices are integer cents.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub catalog_item_id: i64,
    pub sell_price: Money,
    pub purchase_price: Money,
    #[serde(default)]
    pub quantity: i64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        validate_price(self.sell_price, "sell_price")?;
        validate_price(self.purchase_price, "purchase_price")?;
        validate_stock_quantity(self.quantity)
    }
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            catalog_item_id: req.catalog_item_id,
            sell_price: req.sell_price,
            purchase_price: req.purchase_price,
            quantity: req.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub catalog_item_id: Option<i64>,
    pub sell_price: Option<Money>,
    pub purchase_price: Option<Money>,
    pub quantity: Option<i64>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        if let Some(price) = self.sell_price {
            validate_price(price, "sell_price")?;
        }
        if let Some(price) = self.purchase_price {
            validate_price(price, "purchase_price")?;
        }
        if let Some(quantity) = self.quantity {
            validate_stock_quantity(quantity)?;
        }
        Ok(())
    }
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            catalog_item_id: req.catalog_item_id,
            sell_price: req.sell_price,
            purchase_price: req.purchase_price,
            quantity: req.quantity,
        }
    }
}

//----------------------------------------------  Orders  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    #[serde(default = "default_item_quantity")]
    pub quantity: i64,
}

fn default_item_quantity() -> i64 {
    1
}

impl From<OrderItemRequest> for NewOrderItem {
    fn from(req: OrderItemRequest) -> Self {
        Self { product_id: req.product_id, quantity: req.quantity }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.items.is_empty() {
            return Err(ServerError::InvalidRequestBody("an order needs at least one item".into()));
        }
        for item in &self.items {
            validate_item_quantity(item.quantity)?;
        }
        Ok(())
    }

    pub fn into_items(self) -> Vec<NewOrderItem> {
        self.items.into_iter().map(NewOrderItem::from).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemUpdateRequest {
    pub item_id: i64,
    #[serde(default = "default_item_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub delete_item_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub new_items: Option<Vec<OrderItemRequest>>,
    #[serde(default)]
    pub update_items: Option<Vec<OrderItemUpdateRequest>>,
}

impl UpdateOrderRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        for item in self.new_items.iter().flatten() {
            validate_item_quantity(item.quantity)?;
        }
        for item in self.update_items.iter().flatten() {
            validate_item_quantity(item.quantity)?;
        }
        Ok(())
    }
}

impl From<UpdateOrderRequest> for OrderItemChanges {
    fn from(req: UpdateOrderRequest) -> Self {
        Self {
            delete_item_ids: req.delete_item_ids.unwrap_or_default(),
            update_items: req
                .update_items
                .unwrap_or_default()
                .into_iter()
                .map(|u| OrderItemQuantityUpdate { item_id: u.item_id, quantity: u.quantity })
                .collect(),
            new_items: req.new_items.unwrap_or_default().into_iter().map(NewOrderItem::from).collect(),
        }
    }
}

/// An unknown `payment_status` value fails JSON deserialization and surfaces as 422 via the
/// server's JsonConfig error handler.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

//---------------------------------------------- Pagination ----------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    /// Resolves the raw query params against the configured default, clamping nonsense values.
    pub fn resolve(&self, default_page_size: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.filter(|n| *n >= 1).unwrap_or(default_page_size);
        (page, page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub prev_page: Option<String>,
    pub next_page: Option<String>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64, base_url: &str) -> Self {
        let total_pages = if total > 0 { (total + page_size - 1) / page_size } else { 0 };
        let prev_page = (page > 1).then(|| format!("{base_url}?page={}&page_size={page_size}", page - 1));
        let next_page = (page < total_pages).then(|| format!("{base_url}?page={}&page_size={page_size}", page + 1));
        Self { items, total, page, page_size, prev_page, next_page }
    }
}

//----------------------------------------------   Rules  ----------------------------------------------------

fn validate_name(name: &str) -> Result<(), ServerError> {
    if name.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("name must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ServerError::InvalidRequestBody(format!("name exceeds {MAX_NAME_LEN} characters")));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), ServerError> {
    match description {
        Some(d) if d.len() > MAX_DESCRIPTION_LEN => {
            Err(ServerError::InvalidRequestBody(format!("description exceeds {MAX_DESCRIPTION_LEN} characters")))
        },
        _ => Ok(()),
    }
}

fn validate_price(price: Money, field: &str) -> Result<(), ServerError> {
    if price.is_negative() {
        return Err(ServerError::InvalidRequestBody(format!("{field} must not be negative")));
    }
    Ok(())
}

fn validate_stock_quantity(quantity: i64) -> Result<(), ServerError> {
    if quantity < 0 {
        return Err(ServerError::InvalidRequestBody("quantity must not be negative".into()));
    }
    Ok(())
}

fn validate_item_quantity(quantity: i64) -> Result<(), ServerError> {
    if quantity < 1 {
        return Err(ServerError::InvalidRequestBody("quantity must be at least 1".into()));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn orders_need_items() {
        let empty = CreateOrderRequest { items: vec![] };
        assert!(empty.validate().is_err());
        let zero_qty = CreateOrderRequest { items: vec![OrderItemRequest { product_id: 1, quantity: 0 }] };
        assert!(zero_qty.validate().is_err());
        let ok = CreateOrderRequest { items: vec![OrderItemRequest { product_id: 1, quantity: 2 }] };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn item_quantity_defaults_to_one() {
        let req: OrderItemRequest = serde_json::from_str(r#"{"product_id": 5}"#).unwrap();
        assert_eq!(req.quantity, 1);
    }

    #[test]
    fn unknown_payment_status_is_rejected() {
        let err = serde_json::from_str::<PaymentStatusRequest>(r#"{"payment_status": "unknown"}"#);
        assert!(err.is_err());
        let ok = serde_json::from_str::<PaymentStatusRequest>(r#"{"payment_status": "paid"}"#).unwrap();
        assert_eq!(ok.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn update_request_maps_to_change_set() {
        let req: UpdateOrderRequest = serde_json::from_str(
            r#"{"delete_item_ids": [7], "update_items": [{"item_id": 3, "quantity": 4}], "new_items": [{"product_id": 9}]}"#,
        )
        .unwrap();
        req.validate().unwrap();
        let changes = OrderItemChanges::from(req);
        assert_eq!(changes.delete_item_ids, vec![7]);
        assert_eq!(changes.update_items[0].item_id, 3);
        assert_eq!(changes.update_items[0].quantity, 4);
        assert_eq!(changes.new_items[0].product_id, 9);
        assert_eq!(changes.new_items[0].quantity, 1);
    }

    #[test]
    fn pagination_links() {
        let page: Paginated<i64> = Paginated::new(vec![1, 2], 25, 2, 10, "http://localhost/api/products");
        assert_eq!(page.prev_page.as_deref(), Some("http://localhost/api/products?page=1&page_size=10"));
        assert_eq!(page.next_page.as_deref(), Some("http://localhost/api/products?page=3&page_size=10"));
        let last: Paginated<i64> = Paginated::new(vec![], 25, 3, 10, "http://localhost/api/products");
        assert!(last.next_page.is_none());
        let empty: Paginated<i64> = Paginated::new(vec![], 0, 1, 10, "http://localhost/api/products");
        assert!(empty.prev_page.is_none() && empty.next_page.is_none());
    }

    #[test]
    fn page_params_resolve_sane_values() {
        assert_eq!(PageParams::default().resolve(10), (1, 10));
        let p = PageParams { page: Some(0), page_size: Some(-3) };
        assert_eq!(p.resolve(10), (1, 10));
        let p = PageParams { page: Some(3), page_size: Some(50) };
        assert_eq!(p.resolve(10), (3, 50));
    }

    #[test]
    fn register_request_rules() {
        let bad_email = RegisterRequest {
            email: "not-an-email".into(),
            password: "long-enough".into(),
            name: None,
            phone_number: None,
        };
        assert!(bad_email.validate().is_err());
        let short_password = RegisterRequest {
            email: "a@b.example".into(),
            password: "short".into(),
            name: None,
            phone_number: None,
        };
        assert!(short_password.validate().is_err());
    }
}
