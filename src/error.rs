//! # Error Module
//!
//! Request-level error type shared by every handler. Each variant maps to a
//! single HTTP status and renders as `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::auth::jwt::TokenError;
use crate::database::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(name) => {
                AppError::Conflict(format!("username '{}' is already taken", name))
            }
            StoreError::UnknownAuthor(author) => {
                AppError::Validation(format!("author '{}' does not reference an existing user", author))
            }
            StoreError::NotFound => AppError::NotFound("news not found".to_string()),
            StoreError::Backend(e) => {
                tracing::error!("store failure: {:#}", e);
                AppError::Internal("storage failure".to_string())
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => AppError::Unauthorized("Invalid token".to_string()),
            TokenError::Encode(e) => {
                tracing::error!("token issuance failed: {}", e);
                AppError::Internal("Could not generate token".to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("invalid JSON body: {}", rejection.body_text()))
    }
}
