//! JWT Token Service
//!
//! Handles JWT creation, validation, and claims management for user authentication.

use anyhow::bail;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Lifetime of an issued token
pub const TOKEN_TTL_HOURS: i64 = 72;

/// JWT Claims structure containing user information and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User unique identifier
    pub sub: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a new token service with the provided secret.
    ///
    /// An empty secret would sign tokens anyone can forge, so it is refused.
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        if secret.trim().is_empty() {
            bail!("token signing secret must not be empty");
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // Expiry is checked against an explicit clock in `verify_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        })
    }

    /// Issue a token for `subject`, valid for 72 hours from now
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the supplied clock. The token is valid while
    /// `now` is strictly before its `exp` claim.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.decode_claims(token)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::Invalid("empty subject".to_string()));
        }

        Ok(claims.sub)
    }

    /// Decode and check the signature without looking at expiry
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
