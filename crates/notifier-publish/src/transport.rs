//! Signed GraphQL transport.
//!
//! [`GraphqlTransport`] is the seam the pipeline calls through.
//! [`AppSyncTransport`] is the production implementation: it serialises the
//! operation once, signs those exact bytes, and issues a single `POST`. There
//! is no retry here; redelivery belongs to whoever invoked the pipeline.

use crate::error::TransportError;
use crate::operation::GraphqlOperation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notifier_signing::{CredentialSource, SignedRequest, Signer, UnsignedRequest};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A response body: parsed JSON when possible, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
}

impl ResponseBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The GraphQL `errors` array, if the body carries a non-empty one.
    pub fn graphql_errors(&self) -> Option<&[Value]> {
        match self {
            Self::Json(value) => value
                .get("errors")
                .and_then(Value::as_array)
                .filter(|errors| !errors.is_empty())
                .map(Vec::as_slice),
            Self::Raw(_) => None,
        }
    }
}

/// Executes GraphQL operations against the remote endpoint.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, operation: &GraphqlOperation) -> Result<ResponseBody, TransportError>;
}

#[async_trait]
impl<T: GraphqlTransport + ?Sized> GraphqlTransport for Arc<T> {
    async fn execute(&self, operation: &GraphqlOperation) -> Result<ResponseBody, TransportError> {
        (**self).execute(operation).await
    }
}

/// Where and how to reach the GraphQL endpoint. Built once at startup.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: Url,
    pub region: String,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(endpoint: Url, region: impl Into<String>) -> Self {
        Self {
            endpoint,
            region: region.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Signs each operation with version-4 credentials and posts it.
pub struct AppSyncTransport {
    client: reqwest::Client,
    endpoint: Url,
    signer: Signer,
    credentials: Arc<dyn CredentialSource>,
}

impl AppSyncTransport {
    pub fn new(config: TransportConfig, credentials: Arc<dyn CredentialSource>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.endpoint,
            signer: Signer::appsync(config.region),
            credentials,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        self.signer.region()
    }

    /// Builds and signs the request for `operation` at time `at`.
    pub fn sign(
        &self,
        operation: &GraphqlOperation,
        at: DateTime<Utc>,
    ) -> Result<SignedRequest, TransportError> {
        let credentials = self.credentials.credentials()?;
        let body = operation.to_body()?;
        let request = UnsignedRequest::post(self.endpoint.clone(), body)?;
        Ok(self.signer.sign(request, &credentials, at)?)
    }

    async fn send(&self, signed: SignedRequest) -> Result<ResponseBody, TransportError> {
        let mut request = self.client.post(signed.url().clone());
        for (name, value) in signed.headers() {
            request = request.header(name, value);
        }
        let response = request.body(signed.body().to_vec()).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(ResponseBody::from_bytes(&bytes))
    }
}

impl std::fmt::Debug for AppSyncTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSyncTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("region", &self.signer.region())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphqlTransport for AppSyncTransport {
    async fn execute(&self, operation: &GraphqlOperation) -> Result<ResponseBody, TransportError> {
        let signed = self.sign(operation, Utc::now())?;
        let host = signed.endpoint_host().to_string();
        tracing::debug!(
            host = %host,
            operation = %operation.operation_name,
            bytes = signed.body().len(),
            "sending signed GraphQL request"
        );

        let body = self.send(signed).await?;
        if let Some(errors) = body.graphql_errors() {
            tracing::warn!(
                host = %host,
                count = errors.len(),
                "endpoint accepted the request but reported GraphQL errors"
            );
        }
        Ok(body)
    }
}
