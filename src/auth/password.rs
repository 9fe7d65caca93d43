//! Argon2id password hashing.
//!
//! Hashing and verification are CPU-intensive, so the async entry points run
//! them on the blocking pool.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl PasswordHasher {
    #[must_use]
    pub const fn new(config: &SecurityConfig) -> Self {
        Self {
            memory_cost_kib: config.argon2_memory_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_cost_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password into a PHC string.
    pub fn hash_blocking(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    /// Compare a password against a stored PHC string. Parameters are read
    /// from the hash, so hashes produced under older settings still verify.
    pub fn verify_blocking(password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let hasher = *self;
        let password = password.to_string();

        task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .context("Password hashing task panicked")?
    }

    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();

        task::spawn_blocking(move || Self::verify_blocking(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(&SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        })
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash_blocking("abcdef").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHasher::verify_blocking("abcdef", &hash).unwrap());
        assert!(!PasswordHasher::verify_blocking("abcdeg", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash_blocking("same-password").unwrap();
        let b = hasher.hash_blocking("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(PasswordHasher::verify_blocking("x", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash("s3cret!").await.unwrap();
        assert!(hasher.verify("s3cret!", &hash).await.unwrap());
    }
}
