use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AppError;

const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

/// Argon2id hashing and verification, run off the async workers.
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Hash verified against when no account exists, so both login failures cost the same.
    dummy_hash: String,
}

impl PasswordService {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| {
                AppError::ConfigError(format!("invalid password hash parameters: {}", e))
            })?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_blocking(&argon2, DUMMY_PASSWORD)?;

        Ok(Self { argon2, dummy_hash })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(config.hash_memory_kib, config.hash_iterations, config.hash_parallelism)
    }

    /// Returns a PHC string with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hash_blocking(&argon2, &password))
            .await
            .map_err(|e| AppError::InternalError(format!("password hashing task failed: {}", e)))?
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || verify_blocking(&argon2, &password, &hash))
            .await
            .map_err(|e| {
                AppError::InternalError(format!("password verification task failed: {}", e))
            })?
    }

    /// Spends one verification's worth of work and always reports a mismatch.
    pub async fn verify_dummy(&self, password: &str) -> Result<bool, AppError> {
        debug!("Running dummy password verification");
        self.verify(password, &self.dummy_hash).await.map(|_| false)
    }
}

fn hash_blocking(argon2: &Argon2<'_>, password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {}", e)))
}

fn verify_blocking(argon2: &Argon2<'_>, password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(format!("stored password hash is malformed: {}", e)))?;

    // The digest comparison inside is constant-time
    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::InternalError(format!("password verification failed: {}", e))),
    }
}
