use std::env;

use chrono::Duration;
use log::*;
use oms_common::{helpers::parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, Rng};

const DEFAULT_OMS_HOST: &str = "127.0.0.1";
const DEFAULT_OMS_PORT: u16 = 8360;
const DEFAULT_PAGE_SIZE: i64 = 10;
const DEFAULT_TOKEN_EXPIRY: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Default number of rows per page for list endpoints.
    pub page_size: i64,
    /// When true, pending schema migrations are applied at startup.
    pub migrate_on_start: bool,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an issued access token stays valid.
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(String::default()), token_expiry: DEFAULT_TOKEN_EXPIRY }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OMS_HOST.to_string(),
            port: DEFAULT_OMS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            migrate_on_start: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OMS_HOST").ok().unwrap_or_else(|| DEFAULT_OMS_HOST.into());
        let port = env::var("OMS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for OMS_PORT. {e} Using the default, {DEFAULT_OMS_PORT}, instead.");
                    DEFAULT_OMS_PORT
                })
            })
            .unwrap_or(DEFAULT_OMS_PORT);
        let database_url = env::var("OMS_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ OMS_DATABASE_URL is not set. Continuing with an empty database URL.");
            String::default()
        });
        let page_size = env::var("OMS_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let migrate_on_start = parse_boolean_flag(env::var("OMS_MIGRATE_ON_START").ok(), true);
        let auth = AuthConfig::from_env_or_default();
        Self { host, port, database_url, auth, page_size, migrate_on_start }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = match env::var("OMS_JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => Secret::new(secret),
            _ => {
                let secret: String =
                    rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
                warn!(
                    "🪛️ OMS_JWT_SECRET is not set. A random secret has been generated for this run; every issued \
                     token becomes invalid when the server restarts. Set OMS_JWT_SECRET to keep tokens stable."
                );
                Secret::new(secret)
            },
        };
        let token_expiry = env::var("OMS_TOKEN_EXPIRY_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|h| *h >= 1)
            .map(Duration::hours)
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);
        Self { jwt_secret, token_expiry }
    }
}
