//! services/api/src/adapters/passwords.rs
//!
//! Argon2id implementation of the `PasswordService` port.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};
use async_trait::async_trait;
use feedback_coach_core::ports::{PasswordService, PortError, PortResult};
use tokio::task;
use tracing::error;

/// Hashes passwords into PHC strings with a fresh random salt each time.
///
/// Hashing and verification run on tokio's blocking pool.
#[derive(Default)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            PortError::Internal("Failed to hash password".to_string())
        })
}

fn verify_with(argon2: &Argon2<'_>, password: &str, password_hash: &str) -> PortResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        PortError::Internal("Stored password hash is unreadable".to_string())
    })?;

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(PortError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

fn join_error(e: task::JoinError) -> PortError {
    error!("Password task failed: {}", e);
    PortError::Internal("Password task failed".to_string())
}

#[async_trait]
impl PasswordService for Argon2PasswordService {
    async fn hash(&self, password: &str) -> PortResult<String> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        task::spawn_blocking(move || hash_with(&argon2, &password))
            .await
            .map_err(join_error)?
    }

    async fn verify(&self, password: &str, password_hash: &str) -> PortResult<bool> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        task::spawn_blocking(move || verify_with(&argon2, &password, &password_hash))
            .await
            .map_err(join_error)?
    }
}
