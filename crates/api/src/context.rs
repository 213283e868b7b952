use chrono::{DateTime, Utc};

use hcm_auth::{Principal, Role};

/// Principal context for a request (authenticated identity + role).
///
/// Inserted by the auth middleware; every directory route reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    session_expires_at: DateTime<Utc>,
}

impl PrincipalContext {
    pub fn new(principal: Principal, session_expires_at: DateTime<Utc>) -> Self {
        Self {
            principal,
            session_expires_at,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn username(&self) -> &str {
        self.principal.username()
    }

    pub fn role(&self) -> Role {
        self.principal.role()
    }

    pub fn session_expires_at(&self) -> DateTime<Utc> {
        self.session_expires_at
    }
}
