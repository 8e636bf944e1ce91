//! Secret hashing for stored credentials
//!
//! Secrets are stored as argon2id PHC strings. Verification of an unknown
//! account still runs a full argon2 comparison against a decoy hash, so a
//! failed login costs the same whether or not the username exists.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::ServiceError;

/// Argon2id hasher with a decoy hash for unknown accounts
pub struct SecretHasher {
    argon2: Argon2<'static>,
    decoy_hash: String,
}

impl SecretHasher {
    pub fn new() -> Result<Self, ServiceError> {
        let argon2 = Argon2::default();
        let decoy_hash = hash_with(&argon2, "decoy-secret-for-unknown-accounts")?;
        Ok(Self { argon2, decoy_hash })
    }

    /// Hash a secret, returning the PHC string (salt and parameters included)
    pub fn hash(&self, secret: &str) -> Result<String, ServiceError> {
        hash_with(&self.argon2, secret)
    }

    /// Check a secret against a stored PHC hash
    pub fn verify(&self, secret: &str, stored: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| ServiceError::Internal(format!("Invalid password hash format: {e}")))?;

        Ok(self
            .argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verify against `stored`, or burn one comparison on the decoy when the
    /// account does not exist. Always false for a missing account.
    pub fn verify_account(&self, secret: &str, stored: Option<&str>) -> Result<bool, ServiceError> {
        match stored {
            Some(hash) => self.verify(secret, hash),
            None => {
                self.verify(secret, &self.decoy_hash)?;
                Ok(false)
            }
        }
    }
}

fn hash_with(argon2: &Argon2<'static>, secret: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {e}")))
}
