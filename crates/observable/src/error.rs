#![forbid(unsafe_code)]

//! Error types.

use thiserror::Error;

/// Result alias for fallible observable operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by observable values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A write was attempted on a value whose contents are driven by an
    /// updater (for example a value returned from `observe`).
    #[error("can't set a value that has an associated updater; such values are read-only")]
    ReadOnly,
}
