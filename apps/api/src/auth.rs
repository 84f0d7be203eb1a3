//! Bearer-token identity and the subscription gate.
//!
//! Access tokens are HS256 JWTs issued by the hosted auth provider. The user id is the
//! `sub` claim; the audience is always `authenticated`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const TOKEN_AUDIENCE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
}

/// The caller, resolved from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// An authenticated caller whose mirrored subscription is active or trialing.
#[derive(Debug, Clone)]
pub struct ActiveSubscriber(pub AuthUser);

pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| {
            debug!("Token rejected: {e}");
            AppError::Unauthorized
        })?;

    let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| {
        warn!("Token subject is not a UUID");
        AppError::Unauthorized
    })?;

    Ok(AuthUser {
        user_id,
        email: data.claims.email,
    })
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        verify_token(token, &state.config.auth_jwt_secret)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ActiveSubscriber {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        match state.billing_store.subscription_for_user(user.user_id).await? {
            Some(sub) if sub.is_active() => Ok(ActiveSubscriber(user)),
            _ => Err(AppError::SubscriptionRequired),
        }
    }
}
