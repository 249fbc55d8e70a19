use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use busline_core::identity::{CurrentUser, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(secret: &str, user: &CurrentUser, ttl: Duration) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() else {
        return Ok(None);
    };

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(e.to_string()))?;

    Ok(Some(CurrentUser {
        id: token_data.claims.sub,
        role: token_data.claims.role,
    }))
}

/// The caller, or `None` for guest checkout. A token that is present but
/// invalid is still rejected.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_user(parts, state).map(MaybeUser)
    }
}

/// Operator or admin.
pub struct Operator(pub CurrentUser);

impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)?
            .ok_or_else(|| AppError::AuthenticationError("missing bearer token".into()))?;
        if !user.is_operator() {
            return Err(AppError::AuthorizationError("operator role required".into()));
        }
        Ok(Operator(user))
    }
}

/// Driver or admin.
pub struct Driver(pub CurrentUser);

impl FromRequestParts<AppState> for Driver {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)?
            .ok_or_else(|| AppError::AuthenticationError("missing bearer token".into()))?;
        if !user.is_driver() {
            return Err(AppError::AuthorizationError("driver role required".into()));
        }
        Ok(Driver(user))
    }
}
