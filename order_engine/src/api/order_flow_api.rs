use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrderItem, OrderDetail, OrderItemChanges, PaymentStatus},
    events::{EventProducers, OrderSettledEvent},
    traits::{OrderFlowDatabase, OrderFlowError},
};

/// `OrderFlowApi` is the primary API for creating and editing orders and for driving the payment
/// settlement workflow.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Creates a brand-new order for the user. Each line's product is resolved, and its current
    /// sell price is captured into the item; later price changes never affect this order.
    pub async fn create_order(&self, user_id: i64, items: &[NewOrderItem]) -> Result<OrderDetail, OrderFlowError> {
        let order = self.db.create_order(user_id, items).await?;
        debug!("🔄️📦️ Order #{} created for user #{user_id}", order.order.id);
        Ok(order)
    }

    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<OrderDetail>, OrderFlowError> {
        self.db.fetch_order_detail(order_id).await
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<OrderDetail>, OrderFlowError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// Applies an item change set to an order. Deletions are processed first, then quantity
    /// updates, then new items; the whole change set is one transaction.
    pub async fn update_order_items(
        &self,
        order_id: i64,
        changes: OrderItemChanges,
    ) -> Result<OrderDetail, OrderFlowError> {
        let order = self.db.update_order_items(order_id, changes).await?;
        debug!("🔄️📦️ Order #{order_id} item update complete");
        Ok(order)
    }

    /// Runs the settlement workflow for an order and publishes an [`OrderSettledEvent`] once the
    /// transaction has committed.
    pub async fn settle_order(
        &self,
        order_id: i64,
        new_status: PaymentStatus,
        acting_user: i64,
    ) -> Result<OrderDetail, OrderFlowError> {
        let order = self.db.settle_order(order_id, new_status, acting_user).await?;
        self.call_order_settled_hook(&order).await;
        debug!("🔄️💰️ Order #{order_id} settlement complete. Status is now {new_status}");
        Ok(order)
    }

    async fn call_order_settled_hook(&self, order: &OrderDetail) {
        for emitter in &self.producers.order_settled_producer {
            trace!("🔄️💰️ Notifying order settled hook subscribers");
            let event = OrderSettledEvent::new(order.order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
