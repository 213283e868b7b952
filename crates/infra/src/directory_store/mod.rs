//! [`hcm_directory::DirectoryStore`] implementations.
//!
//! Both backends give the same guarantees: each pair write is atomic,
//! employee email / user email / username are unique, and employee writes
//! are checked against the caller's expected version.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryDirectoryStore;
pub use postgres::PostgresDirectoryStore;
