//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can leave the intercepting handler
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    /// Engine-originated error, passed through unchanged
    #[error(transparent)]
    Engine(#[from] DomainError),

    /// Test-author-configured synthetic failure
    #[error("Injected failure: {status_code} {error_code}: {error_message}")]
    Injected {
        status_code: u16,
        error_code: String,
        error_message: String,
    },
}

impl ApplicationError {
    /// Whether this error was configured by the embedding test code rather
    /// than produced by the engine.
    pub const fn is_injected(&self) -> bool {
        matches!(self, Self::Injected { .. })
    }
}
