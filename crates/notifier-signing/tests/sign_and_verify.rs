use chrono::Utc;
use notifier_signing::{CredentialSource, Credentials, Signer, SigningError, UnsignedRequest};
use url::Url;

fn endpoint() -> Url {
    Url::parse("https://example123.appsync-api.eu-central-1.amazonaws.com/graphql").unwrap()
}

#[test]
fn request_signed_now_verifies() {
    let creds = Credentials::new("AKIAEXAMPLE", "secret").with_session_token("session");
    let request = UnsignedRequest::post(endpoint(), br#"{"query":"{ ping }"}"#.to_vec()).unwrap();
    let signed = Signer::appsync("eu-central-1")
        .sign(request, &creds, Utc::now())
        .unwrap();

    assert!(signed.verify(&creds));
    assert_eq!(signed.header_value("content-type"), Some("application/json"));
    assert_eq!(signed.body(), br#"{"query":"{ ping }"}"#);
}

#[test]
fn changing_body_requires_a_new_signature() {
    let creds = Credentials::new("AKIAEXAMPLE", "secret");
    let signer = Signer::appsync("eu-central-1");
    let now = Utc::now();

    let first = signer
        .sign(UnsignedRequest::post(endpoint(), b"{}".to_vec()).unwrap(), &creds, now)
        .unwrap();
    let first_signature = first.signature().to_string();

    let second = signer
        .sign(first.into_unsigned().with_body(b"{ }".to_vec()), &creds, now)
        .unwrap();

    assert_ne!(second.signature(), first_signature);
    assert!(second.verify(&creds));
}

#[test]
fn region_is_part_of_the_signature() {
    let creds = Credentials::new("AKIAEXAMPLE", "secret");
    let now = Utc::now();
    let east = Signer::appsync("us-east-1")
        .sign(UnsignedRequest::post(endpoint(), b"{}".to_vec()).unwrap(), &creds, now)
        .unwrap();
    let west = Signer::appsync("us-west-2")
        .sign(UnsignedRequest::post(endpoint(), b"{}".to_vec()).unwrap(), &creds, now)
        .unwrap();
    assert_ne!(east.signature(), west.signature());
}

#[test]
fn url_without_host_cannot_be_signed() {
    let url = Url::parse("data:text/plain,hello").unwrap();
    let err = UnsignedRequest::post(url, Vec::new()).unwrap_err();
    assert!(matches!(err, SigningError::MissingHost(_)));
}

#[test]
fn credential_sources_resolve() {
    let configured: Option<Credentials> = Some(Credentials::new("AKID", "secret"));
    assert_eq!(configured.credentials().unwrap().access_key_id(), "AKID");

    let boxed: Box<dyn CredentialSource> = Box::new(Credentials::new("AKID2", "secret"));
    assert_eq!(boxed.credentials().unwrap().access_key_id(), "AKID2");
}
