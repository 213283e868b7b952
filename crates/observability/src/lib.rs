//! Tracing/logging setup shared by the directory binaries.

pub mod subscriber;

pub use subscriber::DEFAULT_DIRECTIVES;

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init(DEFAULT_DIRECTIVES);
}
