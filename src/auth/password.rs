//! Password hashing with Argon2.

use anyhow::{Result, anyhow};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString}};
use std::sync::LazyLock;

// Hash checked when the username is unknown, so a miss costs one Argon2 run
// like a wrong password does.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("news-server-dummy-password").ok());

/// Hash a password into a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("failed to hash password: {}", e))
}

/// Check a password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; a stored value that is not a valid hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| anyhow!("stored password hash is invalid: {}", e))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Run a verification against a throwaway hash and discard the outcome.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}
