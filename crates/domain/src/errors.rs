//! Domain-level errors

use thiserror::Error;

/// Errors produced by the data engine and the document model.
///
/// Every variant maps onto a wire-visible error code so the transport can
/// serialize it the way a real service would.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// The requested table or stream does not exist
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The table already exists or is being mutated concurrently
    #[error("Resource in use: {0}")]
    ResourceInUse(String),

    /// A request parameter failed validation against the schema
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A subscriber-level limit was exceeded
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// A shard iterator refers to a position that is no longer readable
    #[error("Iterator expired: {0}")]
    ExpiredIterator(String),
}

impl DomainError {
    /// Wire error code, in the `<Name>Exception` convention clients expect.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ResourceNotFound(_) => "ResourceNotFoundException",
            Self::ResourceInUse(_) => "ResourceInUseException",
            Self::Validation(_) => "ValidationException",
            Self::LimitExceeded(_) => "LimitExceededException",
            Self::ExpiredIterator(_) => "ExpiredIteratorException",
        }
    }

    /// HTTP status the wire layer responds with. All engine errors are
    /// client errors; server-side failures only exist as injected specs.
    pub const fn status_code(&self) -> u16 {
        400
    }
}
