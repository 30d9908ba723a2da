//! # Postgres database methods
//!
//! This module contains "low-level" Postgres database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that
//! accept a `&mut PgConnection` argument. Callers can obtain a connection from a pool, or create
//! an atomic transaction as the need arises and call through to the functions without any other
//! changes, passing `&mut *tx` as the connection argument.
use std::env;

use log::info;
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};

pub mod catalog;
pub mod history;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod users;

const PG_DB_URL: &str = "postgres://localhost/oms_store";

pub fn db_url() -> String {
    let result = env::var("OMS_DATABASE_URL").unwrap_or_else(|_| {
        info!("OMS_DATABASE_URL is not set. Using the default.");
        PG_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<PgPool, SqlxError> {
    let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Applies the embedded schema migrations to the given pool.
pub async fn run_migrations(pool: &PgPool) -> Result<(), SqlxError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("🗃️ Migrations complete");
    Ok(())
}
