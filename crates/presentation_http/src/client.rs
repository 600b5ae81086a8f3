//! Typed wire client
//!
//! A thin reqwest wrapper speaking the same protocol the server serves. The
//! façade's `reset()` uses it to wipe data through the client protocol
//! itself, and the integration tests use it to observe exactly what an SDK
//! would see.

use domain::OperationKind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::wire::{self, TARGET_HEADER, TARGET_PREFIX, WireErrorBody};

/// Errors a wire call can produce.
#[derive(Debug, Error)]
pub enum WireError {
    /// The request never produced a service response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with an error envelope
    #[error("service error {status_code} {error_code}: {message}")]
    Service {
        status_code: u16,
        error_code: String,
        message: String,
    },
}

impl WireError {
    /// Status code of a service error, if this is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Service { status_code, .. } => Some(*status_code),
            Self::Transport(_) => None,
        }
    }

    /// Error code of a service error, if this is one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Service { error_code, .. } => Some(error_code),
            Self::Transport(_) => None,
        }
    }
}

/// Client for one server endpoint.
#[derive(Debug, Clone)]
pub struct WireClient {
    http: reqwest::Client,
    endpoint: String,
}

impl WireClient {
    /// Client against `http://localhost:<port>`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Issue one operation and decode the typed response. Error responses
    /// come back as `WireError::Service` carrying the decoded envelope.
    pub async fn call<I, O>(&self, kind: OperationKind, input: &I) -> Result<O, WireError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let response = self
            .http
            .post(&self.endpoint)
            .header(TARGET_HEADER, format!("{TARGET_PREFIX}{kind}"))
            .json(input)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: WireErrorBody = response.json().await.unwrap_or_default();
        Err(WireError::Service {
            status_code: status.as_u16(),
            error_code: wire::error_code_of(&body.type_marker).to_string(),
            message: body.message,
        })
    }
}
