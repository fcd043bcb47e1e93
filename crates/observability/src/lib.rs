//! Tracing/logging setup shared by the stockdash binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::{LogFormat, init_with_format};
