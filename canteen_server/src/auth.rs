//! Access tokens
//!
//! Identity is owned by an external provider. It hands customers and staff an HS256 JWT, signed with the secret in
//! `CANTEEN_JWT_SECRET`, that they present as `Authorization: Bearer <token>`. The server only ever verifies these
//! tokens. [`TokenIssuer`] exists for tests and local tooling.
use std::{fmt::Display, time::Duration};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use canteen_engine::order_objects::Identity;
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id at the identity provider
    pub sub: String,
    /// Display name. Copied onto orders when they are placed.
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Expiry, in seconds since the Unix epoch
    pub exp: u64,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(sub: S, name: S, role: Role) -> Self {
        Self { sub: sub.into(), name: name.into(), role, exp: 0 }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn identity(&self) -> Identity {
        Identity { user_id: self.sub.clone(), user_name: self.name.clone(), is_admin: self.is_admin() }
    }
}

/// Checks access tokens. Registered as app data so that [`JwtClaims`] can be used as a handler argument.
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("💻️ Access token rejected. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(data.claims)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()));
    }
    Ok(token.trim())
}

fn extract_claims(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let validator = req
        .app_data::<web::Data<TokenValidator>>()
        .ok_or_else(|| ServerError::ConfigurationError("No token validator has been configured".to_string()))?;
    let token = bearer_token(req)?;
    let claims = validator.validate(token)?;
    trace!("💻️ Request authenticated for {} ({})", claims.sub, claims.role);
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req))
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key }
    }

    /// Issue a signed access token for `claims`, valid for `duration` (one day by default). Any `exp` already set
    /// on the claims is replaced.
    pub fn issue_token(&self, mut claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        claims.exp = (Utc::now().timestamp().max(0) as u64).saturating_add(duration.as_secs());
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
