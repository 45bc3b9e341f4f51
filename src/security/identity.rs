//! Per-caller identity used as the rate-limit key.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const KEY_PREFIX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    ApiKey,
    Ip,
}

/// Stable per-caller key: a truncated API key when one is supplied,
/// otherwise the peer address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pub kind: IdentityKind,
    pub value: String,
}

impl ClientIdentity {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let api_key = headers
            .get(API_KEY_HEADER)
            .or_else(|| headers.get(axum::http::header::AUTHORIZATION))
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());

        match api_key {
            Some(key) => Self {
                kind: IdentityKind::ApiKey,
                value: key.chars().take(KEY_PREFIX_LEN).collect(),
            },
            None => Self {
                kind: IdentityKind::Ip,
                value: peer
                    .map(|addr| addr.ip().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            },
        }
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IdentityKind::ApiKey => write!(f, "api:{}", self.value),
            IdentityKind::Ip => write!(f, "ip:{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.1.2.3:55000".parse().unwrap())
    }

    #[test]
    fn test_api_key_is_truncated() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("abcdefghijklmnop"));

        let id = ClientIdentity::from_parts(&headers, peer());
        assert_eq!(id.kind, IdentityKind::ApiKey);
        assert_eq!(id.value, "abcdefghij");
        assert_eq!(id.to_string(), "api:abcdefghij");
    }

    #[test]
    fn test_authorization_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer xyz"));

        let id = ClientIdentity::from_parts(&headers, peer());
        assert_eq!(id.kind, IdentityKind::ApiKey);
        assert_eq!(id.value, "Bearer xyz");
    }

    #[test]
    fn test_ip_fallback() {
        let id = ClientIdentity::from_parts(&HeaderMap::new(), peer());
        assert_eq!(id.kind, IdentityKind::Ip);
        assert_eq!(id.to_string(), "ip:10.1.2.3");

        let id = ClientIdentity::from_parts(&HeaderMap::new(), None);
        assert_eq!(id.value, "unknown");
    }

    #[test]
    fn test_same_prefix_same_identity() {
        let mut a = HeaderMap::new();
        a.insert(API_KEY_HEADER, HeaderValue::from_static("0123456789-one"));
        let mut b = HeaderMap::new();
        b.insert(API_KEY_HEADER, HeaderValue::from_static("0123456789-two"));

        assert_eq!(
            ClientIdentity::from_parts(&a, None),
            ClientIdentity::from_parts(&b, peer())
        );
    }
}
