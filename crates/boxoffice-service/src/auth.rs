//! Authentication extractors.
//!
//! Identity is issued elsewhere; this service only verifies HS256 tokens
//! signed with the shared `JWT_SECRET` and reads the numeric user id out of
//! them. The id is taken from the Hasura claims namespace when present and
//! from a top-level `user_id` claim otherwise.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use boxoffice_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims namespace used by Hasura-compatible identity providers.
pub const HASURA_CLAIMS: &str = "https://hasura.io/jwt/claims";

/// An authenticated user extracted from a Bearer JWT.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user_id = verify_token(token, &state.config.jwt_secret)?;
        Ok(AuthUser { user_id })
    }
}

/// JWT claims read by this service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Hasura claims namespace.
    #[serde(
        rename = "https://hasura.io/jwt/claims",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hasura: Option<HasuraClaims>,
    /// Fallback user id claim; a string or a number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<serde_json::Value>,
    /// Expiration time.
    pub exp: i64,
}

/// The part of the Hasura namespace this service reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HasuraClaims {
    /// User id as a decimal string.
    #[serde(rename = "x-hasura-user-id", default)]
    pub user_id: Option<String>,
}

impl JwtClaims {
    /// Resolve the caller's user id.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        let raw = self
            .hasura
            .as_ref()
            .and_then(|h| h.user_id.clone())
            .or_else(|| match &self.user_id {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })?;

        raw.trim()
            .parse::<UserId>()
            .ok()
            .filter(|id| id.get() > 0)
    }
}

/// Verify a token and return the user it names.
pub fn verify_token(token: &str, secret: &str) -> Result<UserId, ApiError> {
    if secret.is_empty() {
        tracing::error!("JWT_SECRET is not configured; rejecting request");
        return Err(ApiError::Unauthorized);
    }

    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    data.claims.user_id().ok_or_else(|| {
        tracing::debug!("JWT carries no usable user id");
        ApiError::Unauthorized
    })
}
