//! The behaviour contracts that storage backends must fulfil to drive the order management
//! server. The engine ships a Postgres implementation ([`crate::PgDatabase`]); the server and the
//! endpoint tests only ever talk to these traits.
mod auth_management;
mod catalog_management;
mod order_management;

pub use auth_management::{AuthApiError, AuthManagement};
pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use order_management::{OrderFlowDatabase, OrderFlowError, OrderManagement};
