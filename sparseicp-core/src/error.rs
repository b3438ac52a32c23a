//! Error types for sparseicp

use std::fmt;
use thiserror::Error;

/// Main error type for sparseicp operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

/// Result type alias for sparseicp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Signals that a registration result was requested before it was computed.
///
/// The pre-registration value is carried along so callers always have a safe
/// value to fall back on.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("the registration has not been computed yet, call run() first")]
pub struct NotComputed<T: fmt::Debug> {
    fallback: T,
}

impl<T: fmt::Debug> NotComputed<T> {
    pub fn new(fallback: T) -> Self {
        Self { fallback }
    }

    /// The pre-registration value
    pub fn fallback(&self) -> &T {
        &self.fallback
    }

    pub fn into_fallback(self) -> T {
        self.fallback
    }
}
