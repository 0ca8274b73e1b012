//! crates/feedback_coach_core/src/auth.rs
//!
//! Account signup, credential checks and token verification.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{AuthenticatedUser, IssuedToken, NewUser, User};
use crate::ports::{CredentialStore, PasswordService, PortError, PortResult, TokenService};

/// Shortest password accepted at signup, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Hashed once and verified against when a login names an unknown email.
const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    dummy_hash: OnceLock<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Registers a new account and returns its id.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> PortResult<Uuid> {
        if !is_plausible_email(email) {
            return Err(PortError::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PortError::InvalidInput(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.users.find_by_email(email).await?.is_some() {
            debug!("Signup rejected: email already registered");
            return Err(PortError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self.passwords.hash(password).await?;
        let user_id = self
            .users
            .create(&NewUser {
                email: email.to_string(),
                password_hash,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            })
            .await?;

        info!(user_id = %user_id, "User account created");
        Ok(user_id)
    }

    /// Checks the credentials and issues a signed access token.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> PortResult<IssuedToken> {
        let Some(credentials) = self.users.find_by_email(email).await? else {
            self.verify_against_dummy(password).await;
            debug!("Login rejected");
            return Err(PortError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !self
            .passwords
            .verify(password, &credentials.password_hash)
            .await?
        {
            debug!("Login rejected");
            return Err(PortError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = credentials.user;
        self.users.record_login(user.id, Utc::now()).await?;

        let token = self.tokens.issue(&AuthenticatedUser {
            user_id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        })?;
        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Spends the same hashing work as a real password check, so an unknown
    /// email takes as long to reject as a wrong password.
    async fn verify_against_dummy(&self, password: &str) {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => match self.passwords.hash(DUMMY_PASSWORD).await {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash),
                Err(e) => {
                    debug!(error = %e, "Could not prepare placeholder hash");
                    return;
                }
            },
        };
        let _ = self.passwords.verify(password, hash).await;
    }

    pub fn verify(&self, token: &str) -> PortResult<AuthenticatedUser> {
        self.tokens.verify(token)
    }

    /// Reloads the account behind a verified token.
    pub async fn current_user(&self, identity: &AuthenticatedUser) -> PortResult<User> {
        self.users
            .find_by_email(&identity.email)
            .await?
            .map(|credentials| credentials.user)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
