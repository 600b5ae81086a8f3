//! API error handling
//!
//! Every error leaving the transport — decode failures, engine errors, and
//! injected failures alike — is serialized as a status code plus the wire
//! error envelope, indistinguishable in shape from a real service error.

use application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::DomainError;
use thiserror::Error;

use crate::wire::{self, WireErrorBody};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// The target header was missing entirely
    #[error("request is missing the operation target header")]
    MissingTarget,

    /// The target header named an operation outside the closed set
    #[error("unknown operation target: {0}")]
    UnknownOperation(String),

    /// The request body could not be decoded for the named operation
    #[error("malformed request body: {0}")]
    Malformed(String),

    /// Engine-originated error, surfaced with its own code and status
    #[error(transparent)]
    Engine(#[from] DomainError),

    /// Test-author-configured failure, surfaced exactly as configured
    #[error("injected failure: {status_code} {error_code}")]
    Injected {
        status_code: u16,
        error_code: String,
        error_message: String,
    },
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Engine(engine) => Self::Engine(engine),
            ApplicationError::Injected {
                status_code,
                error_code,
                error_message,
            } => Self::Injected {
                status_code,
                error_code,
                error_message,
            },
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::UnknownOperation(_) | Self::Malformed(_) => {
                StatusCode::BAD_REQUEST
            },
            Self::Engine(engine) => StatusCode::from_u16(engine.status_code())
                .unwrap_or(StatusCode::BAD_REQUEST),
            Self::Injected { status_code, .. } => StatusCode::from_u16(*status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Self::MissingTarget => "MissingTargetException",
            Self::UnknownOperation(_) => "UnknownOperationException",
            Self::Malformed(_) => "SerializationException",
            Self::Engine(engine) => engine.error_code(),
            Self::Injected { error_code, .. } => error_code,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Injected { error_message, .. } => error_message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = WireErrorBody {
            type_marker: wire::error_type(self.error_code()),
            message: self.message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
