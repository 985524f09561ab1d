//! The version-4 signing algorithm.
//!
//! 1. Canonical request: method, canonical URI, canonical query string,
//!    `name:value` lines for every signed header, the signed header list, and
//!    the hex SHA-256 of the body.
//! 2. String to sign: algorithm, timestamp, credential scope
//!    (`date/region/service/aws4_request`), hex SHA-256 of step 1.
//! 3. Signing key: `HMAC("AWS4" + secret, date)` chained through region,
//!    service, and the `aws4_request` terminator.
//! 4. Signature: hex `HMAC(signing key, string to sign)`.

use crate::credentials::Credentials;
use crate::error::SigningError;
use crate::request::{
    SignedRequest, UnsignedRequest, AUTHORIZATION, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm identifier placed in the string to sign and the `authorization` header.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name the GraphQL endpoint expects in the credential scope.
pub const APPSYNC_SERVICE: &str = "appsync";

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Signs requests for one region and service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    region: String,
    service: String,
}

/// Everything that feeds the canonical request.
pub(crate) struct SigningInput<'a> {
    pub method: &'a str,
    pub url: &'a Url,
    pub headers: &'a BTreeMap<String, String>,
    pub signed_headers: &'a [String],
    pub body: &'a [u8],
    pub amz_date: &'a str,
}

impl Signer {
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// A signer scoped to the GraphQL service in `region`.
    pub fn appsync(region: impl Into<String>) -> Self {
        Self::new(region, APPSYNC_SERVICE)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Signs `request` at time `at`.
    ///
    /// Adds `x-amz-date` (and `x-amz-security-token` for temporary
    /// credentials) before signing so both are covered, then attaches the
    /// `authorization` header, which is not itself signed.
    pub fn sign(
        &self,
        request: UnsignedRequest,
        credentials: &Credentials,
        at: DateTime<Utc>,
    ) -> Result<SignedRequest, SigningError> {
        credentials.validate()?;

        let UnsignedRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        if !headers.contains_key("host") {
            return Err(SigningError::MissingHeader("host".to_string()));
        }

        let amz_date = at.format(AMZ_DATE_FORMAT).to_string();
        headers.remove(AUTHORIZATION);
        headers.insert(X_AMZ_DATE.to_string(), amz_date.clone());
        match credentials.session_token() {
            Some(token) => {
                headers.insert(X_AMZ_SECURITY_TOKEN.to_string(), token.to_string());
            }
            None => {
                headers.remove(X_AMZ_SECURITY_TOKEN);
            }
        }

        let signed_headers: Vec<String> = headers.keys().cloned().collect();
        let signature = self.signature_for(
            &SigningInput {
                method: &method,
                url: &url,
                headers: &headers,
                signed_headers: &signed_headers,
                body: &body,
                amz_date: &amz_date,
            },
            credentials,
        )?;

        headers.insert(
            AUTHORIZATION.to_string(),
            authorization_header(
                credentials.access_key_id(),
                &self.scope(&amz_date),
                &signed_headers,
                &signature,
            ),
        );

        tracing::debug!(
            method = %method,
            host = headers.get("host").map(String::as_str).unwrap_or_default(),
            signed_headers = %signed_headers.join(";"),
            amz_date = %amz_date,
            "signed outbound request"
        );

        Ok(SignedRequest {
            method,
            url,
            headers,
            body,
            signed_headers,
            amz_date,
            region: self.region.clone(),
            service: self.service.clone(),
            signature,
        })
    }

    /// Credential scope for a timestamp in `YYYYMMDDTHHMMSSZ` form.
    pub(crate) fn scope(&self, amz_date: &str) -> String {
        let date = amz_date.get(..8).unwrap_or(amz_date);
        format!("{date}/{}/{}/{SCOPE_TERMINATOR}", self.region, self.service)
    }

    pub(crate) fn signature_for(
        &self,
        input: &SigningInput<'_>,
        credentials: &Credentials,
    ) -> Result<String, SigningError> {
        let canonical = canonical_request(input)?;
        let scope = self.scope(input.amz_date);
        let to_sign = string_to_sign(input.amz_date, &scope, &canonical);
        let date = input.amz_date.get(..8).unwrap_or(input.amz_date);
        let key = signing_key(
            credentials.secret_access_key(),
            date,
            &self.region,
            &self.service,
        )?;
        Ok(hex::encode(hmac_sha256(&key, to_sign.as_bytes())?))
    }
}

pub(crate) fn authorization_header(
    access_key_id: &str,
    scope: &str,
    signed_headers: &[String],
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={access_key_id}/{scope}, SignedHeaders={}, Signature={signature}",
        signed_headers.join(";")
    )
}

fn canonical_request(input: &SigningInput<'_>) -> Result<String, SigningError> {
    let mut canonical_headers = String::new();
    for name in input.signed_headers {
        let value = input
            .headers
            .get(name)
            .ok_or_else(|| SigningError::MissingHeader(name.clone()))?;
        canonical_headers.push_str(name);
        canonical_headers.push(':');
        canonical_headers.push_str(&normalize_header_value(value));
        canonical_headers.push('\n');
    }

    Ok(format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        input.method,
        canonical_uri(input.url),
        canonical_query(input.url),
        canonical_headers,
        input.signed_headers.join(";"),
        sha256_hex(input.body)
    ))
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    )
}

fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Trims and collapses internal runs of whitespace.
fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Each path segment URI-encoded once more, as non-S3 services expect.
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 encoding: unreserved characters pass through, everything else
/// becomes `%XX` with uppercase hex.
fn uri_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}
