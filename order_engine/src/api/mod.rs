pub mod auth_api;
pub mod catalog_api;
pub mod order_flow_api;

pub use auth_api::AuthApi;
pub use catalog_api::CatalogApi;
pub use order_flow_api::OrderFlowApi;
