//! crates/feedback_coach_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! cryptographic libraries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthenticatedUser, Document, DocumentSummary, IssuedToken, NewTrainingSample, NewUser,
    TrainingSample, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port and service.
///
/// Protocol concerns (status codes, headers) are decided by the caller; nothing
/// in here knows about HTTP.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Malformed, missing or wrong-type request data.
    #[error("{0}")]
    InvalidInput(String),
    /// Request data exceeds a size limit.
    #[error("{0}")]
    TooLarge(String),
    /// Missing, malformed, expired or forged token; wrong credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Duplicate email or duplicate document title.
    #[error("{0}")]
    Conflict(String),
    /// The item is absent, or it is not owned by the caller.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A store or primitive failed; the message is for operators.
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a new account. Fails with `Conflict` when the email is taken.
    async fn create(&self, user: &NewUser) -> PortResult<Uuid>;

    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    /// Stamps a successful login.
    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()>;
}

/// Per-owner document persistence. Every operation is scoped by `user_id`, so a
/// document owned by someone else is indistinguishable from a missing one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists_title_for_user(&self, user_id: Uuid, title: &str) -> PortResult<bool>;

    async fn insert(&self, user_id: Uuid, title: &str, content: &str) -> PortResult<Uuid>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> PortResult<Vec<DocumentSummary>>;

    async fn get(&self, document_id: Uuid, user_id: Uuid) -> PortResult<Option<Document>>;

    async fn update_content(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> PortResult<bool>;

    async fn rename(&self, document_id: Uuid, user_id: Uuid, new_title: &str) -> PortResult<bool>;

    /// Returns the removed record so callers can confirm what was deleted.
    async fn delete(&self, document_id: Uuid, user_id: Uuid) -> PortResult<Option<Document>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrainingCorpusStore: Send + Sync {
    /// Appends a sample and returns the stored row.
    async fn append(&self, sample: &NewTrainingSample) -> PortResult<TrainingSample>;
}

//=========================================================================================
// Cryptographic Ports (Traits)
//=========================================================================================

/// Password hashing is CPU-bound; implementations should keep it off the
/// async executor's worker threads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordService: Send + Sync {
    /// Produces a salted one-way hash of the password.
    async fn hash(&self, password: &str) -> PortResult<String>;

    /// Compares a password against a stored hash in constant time.
    async fn verify(&self, password: &str, password_hash: &str) -> PortResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Signs a token embedding the identity claims with a fixed expiry window.
    fn issue(&self, identity: &AuthenticatedUser) -> PortResult<IssuedToken>;

    /// Checks signature and expiry. Any failure is `Unauthorized`.
    fn verify(&self, token: &str) -> PortResult<AuthenticatedUser>;
}
