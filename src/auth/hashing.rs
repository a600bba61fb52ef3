//! Password hashing and verification.
//!
//! One-way Argon2id hashing in PHC string format. Plaintext passwords never
//! leave this module in any form other than the digest.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::errors::{Error, Result};

pub fn password_hasher() -> Argon2<'static> {
    // Tuned for interactive API calls: Argon2id with moderate memory and a single iteration
    // keeps verification under 10ms on development hardware while retaining side-channel
    // protections.
    const MEMORY_COST_KIB: u32 = 768;
    const ITERATIONS: u32 = 1;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .expect("valid Argon2 parameters");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| Error::internal(format!("Failed to hash password: {}", err)))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored digest.
///
/// A malformed stored digest verifies false rather than erroring; the caller
/// treats it the same as a wrong password.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    password_hasher().verify_password(password.as_bytes(), &parsed).is_ok()
}
