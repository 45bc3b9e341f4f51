//! OAuth 1.0a request signing (token-based authentication).
//!
//! NetSuite's token-based authentication signs every request with
//! HMAC-SHA256 over the canonical request: method, normalized URL and the
//! sorted, percent-encoded parameter set. The realm scopes the header but
//! is not part of the signature. Body hashing is not used.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use url::Url;

use crate::config::NetSuiteConfig;
use crate::netsuite::types::{NetSuiteError, NetSuiteResult};

type HmacSha256 = Hmac<Sha256>;

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 20;

/// Credentials identifying the application (consumer) and the authorized
/// account (token).
#[derive(Clone)]
pub struct SigningCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub token_secret: String,
    pub realm: String,
}

impl SigningCredentials {
    pub fn from_config(config: &NetSuiteConfig) -> Self {
        Self {
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            access_token: config.access_token.clone(),
            token_secret: config.token_secret.clone(),
            realm: config.realm.clone(),
        }
    }
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("realm", &self.realm)
            .field("algorithm", &SIGNATURE_METHOD)
            .finish_non_exhaustive()
    }
}

/// Produces `Authorization` header values for outbound requests.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    credentials: SigningCredentials,
}

impl OAuthSigner {
    pub fn new(credentials: SigningCredentials) -> Self {
        Self { credentials }
    }

    /// Sign a request with a fresh nonce and the current time.
    pub fn authorization_header(&self, method: &str, url: &Url) -> NetSuiteResult<String> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        self.authorization_header_with(method, url, &nonce, &timestamp)
    }

    /// Sign with an explicit nonce and timestamp.
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &Url,
        nonce: &str,
        timestamp: &str,
    ) -> NetSuiteResult<String> {
        let oauth_params = self.oauth_params(nonce, timestamp);
        let base = signature_base_string(method, url, &oauth_params);
        let signature = self.sign(&base)?;

        let mut header = format!("OAuth realm=\"{}\"", encode(&self.credentials.realm));
        for (key, value) in oauth_params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
        {
            header.push_str(&format!(",{}=\"{}\"", key, encode(value)));
        }
        Ok(header)
    }

    fn oauth_params(&self, nonce: &str, timestamp: &str) -> Vec<(&'static str, String)> {
        vec![
            ("oauth_consumer_key", self.credentials.consumer_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_token", self.credentials.access_token.clone()),
            ("oauth_version", OAUTH_VERSION.to_string()),
        ]
    }

    fn sign(&self, base: &str) -> NetSuiteResult<String> {
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.token_secret)
        );
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| NetSuiteError::Config(format!("invalid signing key: {}", e)))?;
        mac.update(base.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Canonical request: `METHOD&enc(base_url)&enc(sorted params)`.
pub fn signature_base_string(method: &str, url: &Url, oauth_params: &[(&str, String)]) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&normalized_url(url)),
        encode(&param_string)
    )
}

/// Scheme, host, non-default port and path; no query or fragment.
fn normalized_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}
