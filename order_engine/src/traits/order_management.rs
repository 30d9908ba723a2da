use thiserror::Error;

use crate::db_types::{NewOrderItem, Order, OrderDetail, OrderItemChanges, PaymentStatus};

/// Read-side order access.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// The order with its line items loaded, or `None` if it does not exist.
    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, OrderFlowError>;

    /// All orders belonging to `user_id`, oldest first, with items loaded.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderDetail>, OrderFlowError>;
}

/// The order mutation flows. Every method is one atomic transaction: a failure in any step rolls
/// the whole operation back, so partial application is never observable.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone + OrderManagement {
    /// Creates an order for `user_id` with the given line items. Each product is resolved and its
    /// current sell price is captured into the new item. The order starts as `unpaid`.
    async fn create_order(&self, user_id: i64, items: &[NewOrderItem]) -> Result<OrderDetail, OrderFlowError>;

    /// Applies an item change set: deletions, then quantity updates, then new items.
    ///
    /// Deleting an item id that is not part of the order is silently ignored, so callers can
    /// retry the same change set without error. Updating an unknown item id fails.
    async fn update_order_items(&self, order_id: i64, changes: OrderItemChanges)
        -> Result<OrderDetail, OrderFlowError>;

    /// The payment settlement workflow.
    ///
    /// In a single transaction: locks the order row, locks the backing product rows in ascending
    /// product-id order, validates stock sufficiency for every item, decrements stock (writing
    /// one history row per changed product), and commits the new payment status. The order must
    /// currently be `unpaid`; settled and canceled orders are immutable.
    ///
    /// Settling to `canceled` changes the status without touching inventory.
    async fn settle_order(
        &self,
        order_id: i64,
        new_status: PaymentStatus,
        acting_user: i64,
    ) -> Result<OrderDetail, OrderFlowError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Order with id {0} not found")]
    OrderNotFound(i64),
    #[error("Order item with id {item_id} not found in order {order_id}")]
    OrderItemNotFound { item_id: i64, order_id: i64 },
    #[error("Product with id {0} not found")]
    ProductNotFound(i64),
    #[error("Insufficient stock for product with id {0}")]
    InsufficientStock(i64),
    #[error("Order {order_id} is already {status} and its payment status cannot change")]
    PaymentStatusImmutable { order_id: i64, status: PaymentStatus },
    #[error("The requested payment status change would be a no-op")]
    PaymentStatusNoOp,
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
