//! Correlation identifiers.
//!
//! A client-supplied `X-Correlation-ID` wins, then `X-Request-ID`; otherwise
//! a UUID v4 is generated. The same value is echoed back in the response.

use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request trace identifier, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Reuse an incoming identifier or generate a new one.
    pub fn resolve(headers: &HeaderMap) -> Self {
        [X_CORRELATION_ID, X_REQUEST_ID]
            .iter()
            .filter_map(|name| headers.get(name))
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value for the response. Incoming values were valid header
    /// text already, so this only fails for generated ids, which never do.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));
        headers.insert(X_CORRELATION_ID, HeaderValue::from_static("corr-1"));

        assert_eq!(CorrelationId::resolve(&headers).as_str(), "corr-1");
    }

    #[test]
    fn test_request_id_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));

        assert_eq!(CorrelationId::resolve(&headers).as_str(), "req-1");
    }

    #[test]
    fn test_generated_when_absent_or_blank() {
        let mut headers = HeaderMap::new();
        headers.insert(X_CORRELATION_ID, HeaderValue::from_static("  "));

        let id = CorrelationId::resolve(&headers);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, CorrelationId::resolve(&HeaderMap::new()));
    }
}
