//! Bearer-token authentication.
//!
//! Access tokens are HS256 JWTs carrying the user id and email. Handlers opt in to
//! authentication by taking a [`JwtClaims`] argument; the extractor rejects requests without a
//! valid `Authorization: Bearer` header before the handler body runs.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use order_engine::db_types::User;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The authenticated user's id.
    pub sub: i64,
    pub email: String,
    /// Expiry as a unix timestamp. Validated on every request.
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: config.token_expiry,
        }
    }

    /// Issue a new access token for the given user. Credentials must have been verified before
    /// calling this.
    pub fn issue_token(&self, user: &User) -> Result<String, ServerError> {
        let exp = (Utc::now() + self.expiry).timestamp();
        let claims = JwtClaims { sub: user.id, email: user.email.clone(), exp };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    pub fn decode_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::ConfigurationError("TokenIssuer is not registered on the app".to_string()))?;
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;
    let claims = issuer.decode_token(token)?;
    debug!("💻️ Access token validated for user #{} ({})", claims.sub, claims.email);
    Ok(claims)
}

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Unspecified(format!("Could not hash password. {e}")))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use oms_common::Secret;
    use order_engine::db_types::User;

    use super::{hash_password, verify_password, TokenIssuer};
    use crate::config::AuthConfig;

    fn test_user() -> User {
        User {
            id: 42,
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            phone_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_config(expiry: Duration) -> AuthConfig {
        AuthConfig { jwt_secret: Secret::new("test-secret-do-not-reuse".to_string()), token_expiry: expiry }
    }

    #[test]
    fn token_round_trip() {
        let issuer = TokenIssuer::new(&test_config(Duration::hours(1)));
        let token = issuer.issue_token(&test_user()).unwrap();
        let claims = issuer.decode_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&test_config(Duration::hours(-1)));
        let token = issuer.issue_token(&test_user()).unwrap();
        assert!(issuer.decode_token(&token).is_err());
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&test_config(Duration::hours(1)));
        let mut token = issuer.issue_token(&test_user()).unwrap();
        token.replace_range(token.len() - 5..token.len(), "aaaaa");
        assert!(issuer.decode_token(&token).is_err());
    }

    #[test]
    fn password_hashing_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(verify_password(&hash, "hunter2!"));
        assert!(!verify_password(&hash, "hunter3!"));
        assert!(!verify_password("not-a-phc-string", "hunter2!"));
    }
}
