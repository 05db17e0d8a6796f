//! Argon2 password hashing.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{rngs::OsRng, RngCore};

const SALT_LEN: usize = 16;

/// Hash `password` into a PHC string with a fresh random salt.
///
/// # Errors
/// Returns an error if the system RNG or the hasher fails.
pub fn hash_password(password: &str) -> Result<String> {
    let mut bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate password salt")?;

    let salt = SaltString::encode_b64(&bytes).map_err(|e| anyhow!("invalid salt: {e}"))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("failed to hash password: {e}"))
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
