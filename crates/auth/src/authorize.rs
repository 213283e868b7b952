use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

/// Check that the principal's role grants `required`.
///
/// - No IO
/// - No panics
/// - Role-level only; record-level scope is decided by the directory policy
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    if principal.role().grants(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role(),
            permission: required,
        })
    }
}
