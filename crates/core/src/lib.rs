//! `hcm-core`: domain foundation building blocks for the employee directory.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{EmployeeId, UserId};
pub use version::ExpectedVersion;
