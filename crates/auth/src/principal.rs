use serde::{Deserialize, Serialize};

use crate::{Role, SessionClaims};

/// An authenticated caller as seen by the directory.
///
/// The username is the session's name claim; it links the caller to a user
/// record (and through that user's email, to an employee profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    username: String,
    role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl From<&SessionClaims> for Principal {
    fn from(claims: &SessionClaims) -> Self {
        Self::new(claims.sub.clone(), claims.role)
    }
}
