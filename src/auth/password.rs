//! Argon2id password hashing, run on the blocking pool.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::task;
use tracing::error;

fn argon2_failure(stage: &'static str, e: password_hash::Error) -> anyhow::Error {
    error!(error = %e, stage, "argon2 failure");
    anyhow::anyhow!("argon2 {}: {}", stage, e)
}

/// Returns a PHC string carrying its own random salt.
pub async fn hash(plain: String) -> anyhow::Result<String> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| argon2_failure("hash", e))
    })
    .await?
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
pub async fn verify(plain: String, stored: String) -> anyhow::Result<bool> {
    task::spawn_blocking(move || -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(&stored).map_err(|e| argon2_failure("parse", e))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    })
    .await?
}
