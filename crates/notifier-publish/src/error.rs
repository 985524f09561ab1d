//! Error types for the transport and the pipeline.

use notifier_signing::{CredentialsError, SigningError};
use notifier_types::AttributeError;
use serde::Serialize;

/// Errors raised by a single signed call to the GraphQL endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No usable credential was available when the request was built.
    #[error("credentials unavailable: {0}")]
    Credentials(#[from] CredentialsError),

    /// The request could not be signed.
    #[error("request signing failed: {0}")]
    Signing(#[source] SigningError),

    /// The GraphQL operation could not be serialised.
    #[error("request encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The request never produced a response (DNS, connect, TLS, timeout, ...).
    #[error("connection failed: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<SigningError> for TransportError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::Credentials(inner) => Self::Credentials(inner),
            other => Self::Signing(other),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection(Box::new(err))
    }
}

/// Machine-readable category of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Credentials,
    Signing,
    Encoding,
    Connection,
    Status,
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Credentials(_) => TransportErrorKind::Credentials,
            Self::Signing(_) => TransportErrorKind::Signing,
            Self::Encoding(_) => TransportErrorKind::Encoding,
            Self::Connection(_) => TransportErrorKind::Connection,
            Self::Status { .. } => TransportErrorKind::Status,
        }
    }

    /// The HTTP status, for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while publishing one eligible record.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The row's native encoding could not be decoded.
    #[error("row deserialization failed: {0}")]
    Deserialization(#[from] AttributeError),

    /// The decoded row could not be serialised into a payload.
    #[error("payload encoding failed: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The signed call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
