//! Argon2id password hashing for the embedded identity provider.
//!
//! Hashes are stored as PHC strings so parameters and salt travel with them.

use super::{RepoError, RepoResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hashes a plaintext password with a random salt.
pub fn hash_password(password: &str) -> RepoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| RepoError::PasswordHash(err.to_string()))?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` on mismatch; errors only for malformed stored hashes.
pub fn verify_password(password: &str, stored_hash: &str) -> RepoResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| RepoError::InvalidData(format!("malformed password hash: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(RepoError::PasswordHash(err.to_string())),
    }
}
