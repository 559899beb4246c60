/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get a token
/// - `GET /api/auth/me` - Current user (bearer token required)
///
/// Register and login both answer with `{ "token": "...", "user": {...} }`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Extension, Json};
use chrono::Duration;
use orghub_shared::{
    auth::{
        jwt::{self, Claims},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token response shared by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,

    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let lifetime = token_lifetime(state.config.jwt.expiration_hours)?;
    let claims = Claims::with_expiration(user.id, user.email.clone(), lifetime);

    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

fn token_lifetime(hours: i64) -> ApiResult<Duration> {
    Duration::try_hours(hours)
        .filter(|lifetime| *lifetime > Duration::zero())
        .ok_or_else(|| {
            tracing::error!(hours, "Configured token lifetime is out of range");
            ApiError::InternalError("Failed to issue token".to_string())
        })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Invalid email or short password
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login with email and password
///
/// Unknown email and wrong password produce the same
/// `401 INVALID_CREDENTIALS` response.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::invalid_credentials());
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse { token, user }))
}

/// Returns the authenticated user
///
/// The auth layer already rejects tokens of deleted users; a deletion racing
/// this lookup yields 404.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user }))
}
