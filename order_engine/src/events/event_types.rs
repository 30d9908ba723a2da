use crate::db_types::Order;

/// Emitted after a settlement transaction has committed. Subscribers see the order with its new
/// payment status; inventory and history changes are already durable at this point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSettledEvent {
    pub order: Order,
}

impl OrderSettledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
