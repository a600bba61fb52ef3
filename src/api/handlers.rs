//! HTTP handlers for the auth endpoints.
//!
//! Handlers stay thin: extract, delegate to [`AuthService`], convert the
//! outcome. Response bodies for forgot-password are fixed strings so the
//! handler cannot leak whether the address was known.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::models::{
    AccountResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RefreshTokenRequest, RegisterRequest, ResetPasswordRequest,
};
use crate::auth::{Account, TokenPair};
use crate::storage;

use super::error::ApiError;
use super::routes::AppState;

/// Pull the bearer token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Malformed Authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Malformed Authorization header"))
}

/// Resolve the calling account from the access token.
async fn current_account(state: &AppState, headers: &HeaderMap) -> Result<Account, ApiError> {
    let token = bearer_token(headers)?;
    state.auth.authenticate_access(token).await.map_err(ApiError::from)
}

/// `POST /api/v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.auth.login(request).await?;
    Ok(Json(pair))
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.auth.refresh(request).await?;
    Ok(Json(pair))
}

/// `POST /api/v1/auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = current_account(&state, &headers).await?;
    state.auth.change_password(&account, request).await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// `POST /api/v1/auth/forgot-password`
///
/// The acknowledgement is identical for known and unknown addresses.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.request_password_reset(request).await?;
    Ok(Json(MessageResponse::new(
        "If the address belongs to an account, a reset link has been sent",
    )))
}

/// `POST /api/v1/auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.reset_password(request).await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// `GET /api/v1/users/me`
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = current_account(&state, &headers).await?;
    Ok(Json(account.into()))
}

/// `GET /api/v1/health`
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    storage::check_connection(&state.pool)
        .await
        .map_err(|_| ApiError::service_unavailable("Database is unreachable"))?;

    Ok(Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }
}
