//! Infrastructure layer: directory storage backends.

pub mod directory_store;

pub use directory_store::{InMemoryDirectoryStore, PostgresDirectoryStore};
