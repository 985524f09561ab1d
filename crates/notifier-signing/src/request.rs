//! Requests before and after signing.

use crate::credentials::Credentials;
use crate::error::SigningError;
use crate::signer::{authorization_header, Signer, SigningInput};
use std::collections::BTreeMap;
use url::Url;

pub(crate) const AUTHORIZATION: &str = "authorization";
pub(crate) const X_AMZ_DATE: &str = "x-amz-date";
pub(crate) const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

/// A request that has not been signed yet.
///
/// Header names are stored lowercased; the `host` header is derived from the
/// URL at construction and always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRequest {
    pub(crate) method: String,
    pub(crate) url: Url,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) body: Vec<u8>,
}

impl UnsignedRequest {
    pub fn new(
        method: impl Into<String>,
        url: Url,
        body: impl Into<Vec<u8>>,
    ) -> Result<Self, SigningError> {
        let host = host_header(&url)?;
        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), host);
        Ok(Self {
            method: method.into().to_ascii_uppercase(),
            url,
            headers,
            body: body.into(),
        })
    }

    /// A JSON `POST`, the only shape the GraphQL endpoint accepts.
    pub fn post(url: Url, body: impl Into<Vec<u8>>) -> Result<Self, SigningError> {
        Ok(Self::new("POST", url, body)?.header("content-type", "application/json"))
    }

    /// Sets a header, replacing any previous value under the same name.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.trim().to_ascii_lowercase(), value.into());
        self
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// `host[:port]` as it must appear in the signed `host` header.
fn host_header(url: &Url) -> Result<String, SigningError> {
    let host = url
        .host_str()
        .ok_or_else(|| SigningError::MissingHost(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// A request carrying a version-4 signature over its exact bytes.
///
/// Fields are private: the only way to alter a signed request is
/// [`SignedRequest::into_unsigned`], which drops the signature.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub(crate) method: String,
    pub(crate) url: Url,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) body: Vec<u8>,
    pub(crate) signed_headers: Vec<String>,
    pub(crate) amz_date: String,
    pub(crate) region: String,
    pub(crate) service: String,
    pub(crate) signature: String,
}

impl SignedRequest {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The endpoint host, exactly as signed.
    pub fn endpoint_host(&self) -> &str {
        self.headers.get("host").map(String::as_str).unwrap_or("")
    }

    /// All headers to transmit, including `authorization`.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// Recomputes the signature from the bytes this request holds and checks
    /// it against the attached `authorization` header.
    pub fn verify(&self, credentials: &Credentials) -> bool {
        let signer = Signer::new(&self.region, &self.service);
        let input = SigningInput {
            method: &self.method,
            url: &self.url,
            headers: &self.headers,
            signed_headers: &self.signed_headers,
            body: &self.body,
            amz_date: &self.amz_date,
        };
        let Ok(expected) = signer.signature_for(&input, credentials) else {
            return false;
        };
        let expected_authorization = authorization_header(
            credentials.access_key_id(),
            &signer.scope(&self.amz_date),
            &self.signed_headers,
            &expected,
        );
        expected == self.signature
            && self.header_value(AUTHORIZATION) == Some(expected_authorization.as_str())
    }

    /// Drops the signature and signing headers so the request can be changed
    /// and signed again.
    pub fn into_unsigned(self) -> UnsignedRequest {
        let mut headers = self.headers;
        headers.remove(AUTHORIZATION);
        headers.remove(X_AMZ_DATE);
        headers.remove(X_AMZ_SECURITY_TOKEN);
        UnsignedRequest {
            method: self.method,
            url: self.url,
            headers,
            body: self.body,
        }
    }
}
