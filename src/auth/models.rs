//! Authentication Models
//!
//! Data structures for authentication requests, responses, and user information.

use serde::{Deserialize, Serialize};

/// Authenticated user information extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
}

/// Registration and login payload
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Token response after successful authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
