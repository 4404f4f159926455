//! Handlers for the `/auth` resource (register, login, refresh, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use banamon_core::types::DbId;
use banamon_db::models::user::UserResponse;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const TOKEN_TYPE: &str = "bearer";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register` and `POST /auth/login`.
///
/// Only presence is checked here; format rules belong to the Token Service.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: DbId,
    pub email: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user_id: DbId,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.auth.register(&input.email, &input.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            email: user.email,
            message: "User registered successfully",
        }),
    ))
}

/// POST /auth/login
///
/// Unknown email and wrong password yield the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CredentialsRequest>,
) -> AppResult<Json<LoginResponse>> {
    let pair = state.auth.login(&input.email, &input.password).await?;
    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: TOKEN_TYPE,
        expires_in: pair.expires_in,
        user_id: pair.user.id,
        email: pair.user.email,
    }))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let grant = state.auth.refresh(&input.refresh_token).await?;
    Ok(Json(RefreshResponse {
        access_token: grant.access_token,
        token_type: TOKEN_TYPE,
        expires_in: grant.expires_in,
    }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth.current_user(auth_user.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}
