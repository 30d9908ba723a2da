pub mod db;
mod pg_impl;

pub use pg_impl::PgDatabase;
