//! `hcm-directory`: the employee directory's access-control and consistency engine.
//!
//! Layout:
//! - `model`: employee profiles, paired user records, validated input
//! - `store`: persistence contract (implemented in `hcm-infra`)
//! - `identity`: maps an authenticated principal to their own employee record
//! - `policy`: per-request access scope and the checks derived from it
//! - `sync`: keeps a user record mirroring its employee
//! - `service`: the five directory operations, wired together
//!
//! No HTTP, no SQL: everything here is testable against an in-memory store.

pub mod error;
pub mod identity;
pub mod model;
pub mod policy;
pub mod service;
pub mod store;
pub mod sync;

pub use error::{DirectoryError, DirectoryResult, StoreError};
pub use identity::resolve_caller;
pub use model::{Employee, EmployeeProfile, NewEmployee, NewUser, Salary, User};
pub use policy::{AccessScope, department_listing};
pub use service::{ClaimsRefresh, DirectoryService, UpdateOutcome};
pub use store::DirectoryStore;
