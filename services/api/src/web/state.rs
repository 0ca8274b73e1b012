//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use feedback_coach_core::ports::{
    CredentialStore, DocumentStore, PasswordService, TokenService, TrainingCorpusStore,
};
use feedback_coach_core::{AuthService, DocumentService, TrainingCorpusService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub documents: Arc<DocumentService>,
    pub training: Arc<TrainingCorpusService>,
}

impl AppState {
    /// Wires the core services onto the given port implementations.
    pub fn new(
        users: Arc<dyn CredentialStore>,
        documents: Arc<dyn DocumentStore>,
        training: Arc<dyn TrainingCorpusStore>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(users, passwords, tokens)),
            documents: Arc::new(DocumentService::new(documents)),
            training: Arc::new(TrainingCorpusService::new(training)),
        }
    }
}
