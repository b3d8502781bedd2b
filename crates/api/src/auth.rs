//! Admin identity: argon2 password verification, HS256 bearer tokens,
//! and the extractors that hand route handlers an authenticated principal
//! or a query audience.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use quillpress_core::post::query::Audience;

use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated admin; assigned to `author` on save.
    pub sub: String,
    /// Superusers get the privileged query audience (drafts visible).
    pub superuser: bool,
    pub exp: usize,
}

/// Check a password against the env-configured argon2 PHC-string hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(username: &str, secret: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: username.to_string(),
        superuser: true,
        exp: (Utc::now().timestamp() + TOKEN_TTL_HOURS * 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Extractor for admin-only routes: rejects requests without a valid
/// bearer token.
pub struct AdminUser(pub Claims);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized)?;
        let claims = decode_token(bearer.token(), &state.config().jwt_secret)
            .ok_or(ApiError::Unauthorized)?;
        Ok(AdminUser(claims))
    }
}

/// Extractor for public routes: a valid superuser token upgrades the
/// caller to the privileged audience; its absence is not an error.
pub struct RequestAudience(pub Audience);

impl FromRequestParts<AppState> for RequestAudience {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let audience =
            match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
                Ok(TypedHeader(Authorization(bearer)))
                    if decode_token(bearer.token(), &state.config().jwt_secret)
                        .is_some_and(|claims| claims.superuser) =>
                {
                    Audience::Privileged
                }
                _ => Audience::Public,
            };
        Ok(RequestAudience(audience))
    }
}
