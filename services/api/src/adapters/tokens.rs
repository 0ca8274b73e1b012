//! services/api/src/adapters/tokens.rs
//!
//! HS256 JSON Web Tokens implementing the `TokenService` port.

use chrono::{DateTime, Duration, Utc};
use feedback_coach_core::domain::{AuthenticatedUser, IssuedToken};
use feedback_coach_core::ports::{PortError, PortResult, TokenService};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const INVALID_TOKEN: &str = "Session expired. Please log in again.";

/// The JWT payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        identity: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> PortResult<IssuedToken> {
        let exp = (now + self.ttl).timestamp();
        let claims = Claims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            iat: now.timestamp(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| PortError::Internal(format!("Failed to sign token: {}", e)))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| PortError::Internal("Token expiry out of range".to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies a token as if the current time were `now`. A token stops
    /// verifying at its `exp` second.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> PortResult<AuthenticatedUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| invalid_token())?
            .claims;
        if claims.exp <= now.timestamp() {
            return Err(invalid_token());
        }

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
        })
    }
}

fn invalid_token() -> PortError {
    PortError::Unauthorized(INVALID_TOKEN.to_string())
}

impl TokenService for JwtTokenService {
    fn issue(&self, identity: &AuthenticatedUser) -> PortResult<IssuedToken> {
        self.issue_at(identity, Utc::now())
    }

    fn verify(&self, token: &str) -> PortResult<AuthenticatedUser> {
        self.verify_at(token, Utc::now())
    }
}
