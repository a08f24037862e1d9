//! Auth routes for registration and login

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use uuid::Uuid;

use crate::auth::models::{Credentials, TokenResponse};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::database::User;
use crate::error::{AppError, AppResult};
use crate::server::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// `POST /register` - create a user and return it (without the password hash)
pub async fn register(
    State(app_state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<(StatusCode, Json<User>)> {
    let Json(payload) = payload?;

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("username and password are required".to_string()));
    }

    // Argon2 is deliberately slow; keep it off the async workers.
    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Failed to hash password: {:#}", e);
            AppError::Internal("Could not create user".to_string())
        })?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: payload.username,
        password_hash,
    };

    let user = app_state.store.insert_user(user).await.map_err(|e| {
        tracing::warn!("Failed to register user: {}", e);
        AppError::from(e)
    })?;
    tracing::info!("Registered user id={} username={}", user.id, user.username);

    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /login` - exchange username/password for a bearer token.
///
/// Unknown users and wrong passwords get the same answer.
pub async fn login(
    State(app_state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(payload) = payload?;

    let password = payload.password;
    let user = match app_state.store.find_user_by_username(&payload.username).await? {
        Some(user) => user,
        None => {
            // Same Argon2 cost as a wrong password, so timing does not reveal the miss.
            tokio::task::spawn_blocking(move || verify_dummy(&password))
                .await
                .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?;
            tracing::info!("Login failed: unknown username");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Stored password hash for user {} is unusable: {:#}", user.id, e);
            AppError::Internal("Could not verify credentials".to_string())
        })?;

    if !matches {
        tracing::info!("Login failed: wrong password for user {}", user.id);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = app_state.tokens.issue(&user.id)?;
    tracing::info!("Issued token for user {}", user.id);

    Ok(Json(TokenResponse { token }))
}

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
