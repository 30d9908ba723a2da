use std::env;

use log::*;
use oms_common::Money;
use order_engine::{
    db_types::{NewCatalogItem, NewProduct, NewUser, Product, User},
    AuthManagement,
    CatalogManagement,
    PgDatabase,
};
use sqlx::{migrate::MigrateDatabase, Postgres};

/// Creates a fresh, uniquely named database and runs the migrations against it.
///
/// Returns `None` when `OMS_TEST_DATABASE_URL` is not set, so the suite can run on machines
/// without a Postgres server; the database tests simply skip themselves.
pub async fn prepare_test_env() -> Option<PgDatabase> {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let base = match env::var("OMS_TEST_DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("OMS_TEST_DATABASE_URL is not set. Skipping database integration test.");
            return None;
        },
    };
    let url = format!("{}/oms_test_{}", base.trim_end_matches('/'), rand::random::<u32>());
    create_database(&url).await;
    let db = run_migrations(&url).await;
    Some(db)
}

pub async fn run_migrations(url: &str) -> PgDatabase {
    let db = PgDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub async fn create_database(url: &str) {
    if let Err(e) = Postgres::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Postgres::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Postgres database {url}");
}

pub async fn seed_user(db: &PgDatabase) -> User {
    let user = NewUser {
        email: format!("user_{}@example.com", rand::random::<u32>()),
        password_hash: "$argon2id$test-hash".to_string(),
        name: Some("Test User".to_string()),
        phone_number: None,
    };
    db.create_user(user).await.expect("Error creating user")
}

pub async fn seed_product(db: &PgDatabase, sell_price: Money, quantity: i64) -> Product {
    let item = db
        .create_catalog_item(NewCatalogItem { name: "Widget".to_string(), description: None })
        .await
        .expect("Error creating catalog item");
    let product = NewProduct {
        catalog_item_id: item.id,
        sell_price,
        purchase_price: Money::from_whole(1),
        quantity,
    };
    db.create_product(product, None).await.expect("Error creating product")
}
