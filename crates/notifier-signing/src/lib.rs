//! Version-4 request signing for the notifier's outbound calls.
//!
//! The GraphQL endpoint authenticates callers by recomputing an
//! HMAC-SHA256 signature over a canonical form of the request. This crate
//! builds that canonical form, derives the date/region/service scoped key
//! from a [`Credentials`] value, and attaches the resulting `authorization`
//! header.
//!
//! A [`SignedRequest`] is immutable: the bytes it holds are the bytes that
//! were signed. Changing anything means calling
//! [`SignedRequest::into_unsigned`] and signing again.
//!
//! ```rust,ignore
//! let signer = Signer::appsync("us-east-1");
//! let request = UnsignedRequest::post(url, body)?;
//! let signed = signer.sign(request, &credentials, Utc::now())?;
//! assert!(signed.verify(&credentials));
//! ```

mod credentials;
mod error;
mod request;
mod signer;

pub use credentials::{CredentialSource, Credentials};
pub use error::{CredentialsError, SigningError};
pub use request::{SignedRequest, UnsignedRequest};
pub use signer::{Signer, ALGORITHM, APPSYNC_SERVICE};
