use mockall::mock;
use order_engine::{
    db_types::{
        CatalogItem,
        CatalogItemUpdate,
        NewCatalogItem,
        NewOrderItem,
        NewProduct,
        NewUser,
        Order,
        OrderDetail,
        OrderItemChanges,
        PaymentStatus,
        Product,
        ProductHistory,
        ProductUpdate,
        User,
    },
    traits::{
        AuthApiError,
        AuthManagement,
        CatalogApiError,
        CatalogManagement,
        OrderFlowDatabase,
        OrderFlowError,
        OrderManagement,
    },
};

mock! {
    pub OrderFlowBackend {}
    impl Clone for OrderFlowBackend {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for OrderFlowBackend {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, OrderFlowError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderDetail>, OrderFlowError>;
    }
    impl OrderFlowDatabase for OrderFlowBackend {
        async fn create_order(&self, user_id: i64, items: &[NewOrderItem]) -> Result<OrderDetail, OrderFlowError>;
        async fn update_order_items(&self, order_id: i64, changes: OrderItemChanges) -> Result<OrderDetail, OrderFlowError>;
        async fn settle_order(&self, order_id: i64, new_status: PaymentStatus, acting_user: i64) -> Result<OrderDetail, OrderFlowError>;
    }
}

mock! {
    pub CatalogBackend {}
    impl Clone for CatalogBackend {
        fn clone(&self) -> Self;
    }
    impl CatalogManagement for CatalogBackend {
        async fn fetch_catalog_items(&self, page: i64, page_size: i64) -> Result<(Vec<CatalogItem>, i64), CatalogApiError>;
        async fn fetch_catalog_item(&self, item_id: i64) -> Result<Option<CatalogItem>, CatalogApiError>;
        async fn create_catalog_item(&self, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError>;
        async fn update_catalog_item(&self, item_id: i64, update: CatalogItemUpdate) -> Result<CatalogItem, CatalogApiError>;
        async fn fetch_products(&self, page: i64, page_size: i64) -> Result<(Vec<Product>, i64), CatalogApiError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;
        async fn create_product(&self, product: NewProduct, acting_user: Option<i64>) -> Result<Product, CatalogApiError>;
        async fn update_product(&self, product_id: i64, update: ProductUpdate, acting_user: Option<i64>) -> Result<Product, CatalogApiError>;
        async fn delete_product(&self, product_id: i64, acting_user: Option<i64>) -> Result<Product, CatalogApiError>;
        async fn fetch_product_history(&self, product_id: i64) -> Result<Vec<ProductHistory>, CatalogApiError>;
    }
}

mock! {
    pub AuthBackend {}
    impl Clone for AuthBackend {
        fn clone(&self) -> Self;
    }
    impl AuthManagement for AuthBackend {
        async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
    }
}
