use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use oms_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

/// Version tag written into every audit snapshot, so that old history rows remain readable if the
/// snapshot layout ever changes.
pub const SNAPSHOT_VERSION: u32 = 1;

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The order has been created and no payment has been settled against it.
    #[default]
    Unpaid,
    /// The order has been settled: stock was decremented and payment received.
    Paid,
    /// The order was canceled before settlement. No stock was reserved or released.
    Canceled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct StatusConversionError(String);

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "canceled" => Ok(Self::Canceled),
            s => Err(StatusConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   ProductAction     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "product_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductAction {
    Created,
    Updated,
    Deleted,
}

impl Display for ProductAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductAction::Created => write!(f, "created"),
            ProductAction::Updated => write!(f, "updated"),
            ProductAction::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for ProductAction {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            s => Err(StatusConversionError(format!("Invalid product action: {s}"))),
        }
    }
}

//--------------------------------------       User          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

//--------------------------------------    CatalogItem      ---------------------------------------------------------
/// A sellable concept in the catalog. Zero or more priced, stocked [`Product`]s back each entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCatalogItem {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CatalogItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

//--------------------------------------      Product        ---------------------------------------------------------
/// A priced, stocked instance of a catalog item. `quantity` never goes negative; the inventory
/// ledger is the only code that may decrement it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub catalog_item_id: i64,
    pub sell_price: Money,
    pub purchase_price: Money,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds the audit snapshot for this product's current persisted state.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            version: SNAPSHOT_VERSION,
            id: self.id,
            catalog_item_id: self.catalog_item_id,
            sell_price: self.sell_price,
            purchase_price: self.purchase_price,
            quantity: self.quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub catalog_item_id: i64,
    pub sell_price: Money,
    pub purchase_price: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub catalog_item_id: Option<i64>,
    pub sell_price: Option<Money>,
    pub purchase_price: Option<Money>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.catalog_item_id.is_none()
            && self.sell_price.is_none()
            && self.purchase_price.is_none()
            && self.quantity.is_none()
    }

    /// Drops every field that already matches the product, so a no-change update leaves the row
    /// (and therefore its history) untouched.
    pub fn normalized_against(mut self, product: &Product) -> Self {
        if self.catalog_item_id == Some(product.catalog_item_id) {
            self.catalog_item_id = None;
        }
        if self.sell_price == Some(product.sell_price) {
            self.sell_price = None;
        }
        if self.purchase_price == Some(product.purchase_price) {
            self.purchase_price = None;
        }
        if self.quantity == Some(product.quantity) {
            self.quantity = None;
        }
        self
    }
}

//--------------------------------------  ProductSnapshot    ---------------------------------------------------------
/// A version-tagged, point-in-time copy of a product's visible fields, stored as the `snapshot`
/// column of a history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub version: u32,
    pub id: i64,
    pub catalog_item_id: i64,
    pub sell_price: Money,
    pub purchase_price: Money,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  ProductHistory     ---------------------------------------------------------
/// An append-only audit record of a product change. Rows are never updated or deleted; the
/// `product_id` and `user_id` references outlive their targets via set-null foreign keys.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductHistory {
    pub id: i64,
    pub product_id: Option<i64>,
    pub user_id: Option<i64>,
    pub action: ProductAction,
    pub snapshot: Json<ProductSnapshot>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     OrderItem       ---------------------------------------------------------
/// A line item of an order. `price` is the product's sell price captured when the item was
/// created; later product price changes never touch it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    /// Must be >= 1. Validated at the request boundary.
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemQuantityUpdate {
    pub item_id: i64,
    pub quantity: i64,
}

/// The change set applied by an order update: deletions first, then quantity edits, then new
/// items, all inside one transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItemChanges {
    pub delete_item_ids: Vec<i64>,
    pub update_items: Vec<OrderItemQuantityUpdate>,
    pub new_items: Vec<NewOrderItem>,
}

impl OrderItemChanges {
    pub fn is_empty(&self) -> bool {
        self.delete_item_ids.is_empty() && self.update_items.is_empty() && self.new_items.is_empty()
    }
}

//--------------------------------------    OrderDetail      ---------------------------------------------------------
/// An order with its line items loaded.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    pub fn total_price(&self) -> Money {
        self.items.iter().map(|i| i.price * i.quantity).sum()
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use chrono::{TimeZone, Utc};
    use oms_common::Money;

    use super::{PaymentStatus, Product, ProductAction, ProductUpdate};

    fn sample_product() -> Product {
        Product {
            id: 1,
            catalog_item_id: 2,
            sell_price: Money::from_whole(100),
            purchase_price: Money::from_whole(50),
            quantity: 5,
            created_at: Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn payment_status_round_trip() {
        for status in [PaymentStatus::Unpaid, PaymentStatus::Paid, PaymentStatus::Canceled] {
            assert_eq!(PaymentStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(PaymentStatus::from_str("refunded").is_err());
    }

    #[test]
    fn product_action_round_trip() {
        for action in [ProductAction::Created, ProductAction::Updated, ProductAction::Deleted] {
            assert_eq!(ProductAction::from_str(&action.to_string()).unwrap(), action);
        }
    }

    #[test]
    fn snapshots_carry_a_version_tag() {
        let snapshot = sample_product().snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["quantity"], 5);
        let back: super::ProductSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn identical_snapshots_compare_equal() {
        let product = sample_product();
        assert_eq!(product.snapshot(), product.snapshot());
        let mut changed = product.clone();
        changed.quantity -= 1;
        assert_ne!(product.snapshot(), changed.snapshot());
    }

    #[test]
    fn update_normalization_drops_unchanged_fields() {
        let product = sample_product();
        let update = ProductUpdate {
            catalog_item_id: Some(2),
            sell_price: Some(Money::from_whole(100)),
            purchase_price: None,
            quantity: Some(4),
        };
        let normalized = update.normalized_against(&product);
        assert!(normalized.catalog_item_id.is_none());
        assert!(normalized.sell_price.is_none());
        assert_eq!(normalized.quantity, Some(4));
        assert!(!normalized.is_empty());

        let noop = ProductUpdate { quantity: Some(5), ..Default::default() };
        assert!(noop.normalized_against(&product).is_empty());
    }
}
