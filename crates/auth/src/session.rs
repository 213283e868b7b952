//! Session issuance and validation (HS256 JWT).
//!
//! The directory core only depends on [`SessionIssuer::install`]: when a
//! caller changes their own role it hands back a refresh instruction and the
//! boundary installs a fresh session through this contract.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{Role, SessionClaims, TokenValidationError, validate_claims};

/// A freshly minted session: the opaque token plus the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Signing(String),
}

/// Mint (or replace) the caller's active session claims.
pub trait SessionIssuer: Send + Sync {
    fn install(&self, username: &str, role: Role) -> Result<Session, SessionError>;
}

/// Decode + verify a session token presented by a caller.
pub trait JwtValidator: Send + Sync {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, TokenValidationError>;
}

/// Symmetric-key session tokens.
#[derive(Clone)]
pub struct Hs256JwtSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256JwtSessions {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue_at(
        &self,
        username: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let claims = SessionClaims {
            sub: username.to_string(),
            role,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        Ok(Session { token, claims })
    }
}

impl core::fmt::Debug for Hs256JwtSessions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtSessions")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer for Hs256JwtSessions {
    fn install(&self, username: &str, role: Role) -> Result<Session, SessionError> {
        tracing::debug!(username, role = %role, "installing session");
        self.issue_at(username, role, Utc::now())
    }
}

impl JwtValidator for Hs256JwtSessions {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, TokenValidationError> {
        // Time-window checks are done deterministically against `now` below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
