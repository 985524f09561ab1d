use crate::error::CredentialsError;
use serde::Deserialize;
use std::fmt;

/// An access key pair, optionally with a session token for temporary credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attaches a session token. Blank tokens are ignored.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.session_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The session token, if one is set and not blank.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Checks that both halves of the key pair are present.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.access_key_id.trim().is_empty() {
            return Err(CredentialsError::Empty("access_key_id"));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(CredentialsError::Empty("secret_access_key"));
        }
        Ok(())
    }
}

/// Supplies the credential used for each outbound request.
///
/// Implementations are resolved once at startup and handed to the transport;
/// they must not consult process-wide state on every call.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Result<Credentials, CredentialsError>;
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        self.validate()?;
        Ok(self.clone())
    }
}

/// `None` models a deployment with no credential configured; every
/// request then fails with [`CredentialsError::Unavailable`].
impl CredentialSource for Option<Credentials> {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        self.as_ref()
            .ok_or(CredentialsError::Unavailable)?
            .credentials()
    }
}
