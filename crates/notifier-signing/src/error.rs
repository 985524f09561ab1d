//! Error types for credentials and signing.

/// Errors raised when no usable credential can be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    /// No credential was configured for this process.
    #[error("no signing credentials are configured")]
    Unavailable,

    /// A required credential field is blank.
    #[error("credential field `{0}` is empty")]
    Empty(&'static str),
}

/// Errors raised while signing a request.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The credential could not be obtained or is incomplete.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The request URL has no host to sign.
    #[error("request URL has no host: {0}")]
    MissingHost(String),

    /// A header that must be signed is absent.
    #[error("required header `{0}` is missing")]
    MissingHeader(String),

    /// The HMAC key could not be initialised.
    #[error("invalid signing key")]
    InvalidKey,
}
