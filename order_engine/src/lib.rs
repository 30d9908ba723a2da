//! Order Engine
//!
//! The order engine is the storage and domain core of the order management server: it tracks a
//! product catalog, sellable products with stock quantities, customer orders with line items, and
//! the payment settlement workflow that moves an order to `paid` while decrementing inventory.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@pg`]). Postgres is the supported backend; it
//!    provides the row-level locking the settlement workflow depends on. You should never need to
//!    access the database directly. Instead, use the public API. The exception is the data types
//!    used in the database, which are defined in [`mod@db_types`] and are public.
//! 2. The engine public API ([`CatalogApi`], [`OrderFlowApi`], [`AuthApi`]), generic over the
//!    backend traits in [`mod@traits`], so servers and tests can swap the storage layer.
//!
//! The engine also emits events after certain actions commit. When an order is settled, an
//! `OrderSettledEvent` is published; hook into it via [`events::EventHooks`].
mod api;
mod pg;

pub mod db_types;
pub mod events;
pub mod traits;

pub use api::{AuthApi, CatalogApi, OrderFlowApi};
pub use pg::PgDatabase;
pub use traits::{
    AuthManagement,
    CatalogManagement,
    OrderFlowDatabase,
    OrderManagement,
};
