//! Authentication Middleware
//!
//! Axum middleware for JWT token validation and user authentication.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;

use crate::auth::{jwt::TokenService, models::AuthUser};
use crate::error::AppError;

/// Authentication middleware that validates JWT tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating JWT tokens.
    ///
    /// The `Authorization` header may carry either `Bearer <token>` or the raw
    /// token, which older clients send.
    pub async fn validate_token(
        State(tokens): State<Arc<TokenService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let token = match extract_token(&req) {
            Some(token) => token,
            None => {
                tracing::warn!("[AuthMiddleware] Missing Authorization header: {} {}", req.method(), req.uri());
                return Err(AppError::Unauthorized("Authorization header is missing".to_string()));
            }
        };

        let subject = match tokens.verify(token) {
            Ok(subject) => subject,
            Err(e) => {
                tracing::warn!("[AuthMiddleware] Token rejected for {} {}: {}", req.method(), req.uri(), e);
                return Err(e.into());
            }
        };
        tracing::debug!("[AuthMiddleware] Authenticated sub={}", subject);

        // Insert the user into request extensions for downstream handlers
        req.extensions_mut().insert(AuthUser { id: subject });

        Ok(next.run(req).await)
    }
}

fn extract_token(req: &Request) -> Option<&str> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())?
        .trim();

    // Auth scheme names are case-insensitive.
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };
    if token.is_empty() { None } else { Some(token) }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}
