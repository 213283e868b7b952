//! `hcm-auth`: authentication/authorization primitives for the directory.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows
//! roles, permissions, principals, session tokens and password credentials,
//! but nothing about employees or where they are kept.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;

pub use authorize::{AuthzError, authorize};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use password::{Argon2PasswordHasher, PasswordCredential, PasswordHashError, PasswordHasher};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{ParseRoleError, Role};
pub use session::{Hs256JwtSessions, JwtValidator, Session, SessionError, SessionIssuer};
