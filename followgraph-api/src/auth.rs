//! OAuth PLAINTEXT credentials carried in the Authorization header

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use followgraph_core::{Credentials, GraphError};

use crate::error::ApiError;

const OAUTH_SCHEME: &str = "OAuth";
const PLAINTEXT: &str = "PLAINTEXT";

/// Credentials presented with a request, `None` when no Authorization
/// header was sent
#[derive(Debug, Clone)]
pub struct OAuthCredentials(pub Option<Credentials>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OAuthCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(OAuthCredentials(None));
        };
        let value = value
            .to_str()
            .map_err(|_| unauthorized("Authorization header is not valid text"))?;
        Ok(OAuthCredentials(Some(parse_authorization(value)?)))
    }
}

fn unauthorized(message: &str) -> ApiError {
    ApiError::Graph(GraphError::Unauthorized(message.to_string()))
}

fn decode(value: &str) -> Result<String, ApiError> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|_| unauthorized("Malformed percent-encoding in Authorization header"))
}

/// Parse `OAuth k="v", ...` into credentials.
///
/// The PLAINTEXT signature is `enc(consumer_secret)&enc(token_secret)`,
/// itself percent-encoded as a header parameter.
pub fn parse_authorization(value: &str) -> Result<Credentials, ApiError> {
    let params = value
        .trim()
        .strip_prefix(OAUTH_SCHEME)
        .filter(|rest| rest.starts_with(' '))
        .ok_or_else(|| unauthorized("Unsupported authorization scheme"))?;

    let mut consumer_key = None;
    let mut token = None;
    let mut method = None;
    let mut signature = None;

    for param in params.split(',') {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (key, raw) = param
            .split_once('=')
            .ok_or_else(|| unauthorized("Malformed OAuth parameter"))?;
        let raw = raw.trim().trim_matches('"');
        match key.trim() {
            "oauth_consumer_key" => consumer_key = Some(decode(raw)?),
            "oauth_token" => token = Some(decode(raw)?),
            "oauth_signature_method" => method = Some(decode(raw)?),
            "oauth_signature" => signature = Some(decode(raw)?),
            // realm, nonce, timestamp, version carry nothing for PLAINTEXT
            _ => {}
        }
    }

    if let Some(method) = method {
        if method != PLAINTEXT {
            return Err(unauthorized("Only the PLAINTEXT signature method is supported"));
        }
    }

    let consumer_key = consumer_key.ok_or_else(|| unauthorized("Missing oauth_consumer_key"))?;
    let signature = signature.ok_or_else(|| unauthorized("Missing oauth_signature"))?;
    let (consumer_secret, token_secret) = signature
        .split_once('&')
        .ok_or_else(|| unauthorized("Malformed oauth_signature"))?;
    let consumer_secret = decode(consumer_secret)?;
    let token_secret = decode(token_secret)?;

    let credentials = Credentials::consumer(consumer_key, consumer_secret);
    match token {
        Some(token) if !token.is_empty() => Ok(credentials.with_token(token, token_secret)),
        // An empty token is only "no token" when no token secret rides along.
        _ if !token_secret.is_empty() => Err(unauthorized("Token secret supplied without a token")),
        _ => Ok(credentials),
    }
}

/// Render credentials as an Authorization header value
pub fn authorization_header(credentials: &Credentials) -> String {
    let (token, token_secret) = match &credentials.token {
        Some(t) => (t.token.as_str(), t.token_secret.as_str()),
        None => ("", ""),
    };
    let signature = format!(
        "{}&{}",
        urlencoding::encode(&credentials.consumer_secret),
        urlencoding::encode(token_secret)
    );

    let mut header = format!(
        "{} oauth_consumer_key=\"{}\", oauth_signature_method=\"{}\", oauth_signature=\"{}\"",
        OAUTH_SCHEME,
        urlencoding::encode(&credentials.consumer_key),
        PLAINTEXT,
        urlencoding::encode(&signature),
    );
    if !token.is_empty() {
        header.push_str(&format!(", oauth_token=\"{}\"", urlencoding::encode(token)));
    }
    header
}
