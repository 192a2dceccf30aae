//! Stored password hashes (argon2, PHC string format).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use quill_core::HttpError;

/// Hash `passwd` with a fresh salt, off the async runtime.
pub async fn hash(passwd: &str) -> Result<String, HttpError> {
    let passwd = passwd.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(passwd.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HttpError::Internal(format!("failed to hash password: {e}")))
    })
    .await
    .map_err(|e| HttpError::Internal(format!("password hashing task failed: {e}")))?
}

/// Whether `passwd` matches `stored`. An unparsable hash never matches.
pub async fn verify(stored: &str, passwd: &str) -> bool {
    let stored = stored.to_string();
    let passwd = passwd.to_string();
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(passwd.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .unwrap_or(false)
}
