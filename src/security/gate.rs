//! Security gate: hardening headers, API keys, size/type limits, pattern scan.
//!
//! # Checks (in order)
//! 1. Hardening headers are always added to the eventual response
//! 2. API key for protected routes (health exempt, only when keys are configured)
//! 3. Declared and actual body size
//! 4. JSON-only content type for mutating methods
//! 5. Injection-pattern scan over query parameters and body content
//!
//! The scan is a coarse outer layer; the query builder still escapes every
//! value it interpolates.

use std::collections::HashSet;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use regex::Regex;

use crate::config::SecurityConfig;
use crate::http::response::ApiError;
use crate::pipeline::RouteScope;
use crate::security::identity::API_KEY_HEADER;

pub const ALLOWED_CONTENT_TYPE: &str = "application/json";

const INJECTION_PATTERNS: [&str; 3] = [
    r"(?i)\b(union|select|insert|delete|update|drop|create|alter)\b",
    r"(--|/\*|\*/|;)",
    r#"['"`]"#,
];

const HARDENING_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// Immutable policy the gate enforces.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    pub allowed_api_keys: HashSet<String>,
    pub max_body_size: usize,
    pub allowed_content_type: &'static str,
    pub injection_patterns: Vec<Regex>,
    pub enable_headers: bool,
}

impl SecurityPolicy {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            allowed_api_keys: config
                .api_keys
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            max_body_size: config.max_body_size,
            allowed_content_type: ALLOWED_CONTENT_TYPE,
            injection_patterns: INJECTION_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("injection pattern compiles"))
                .collect(),
            enable_headers: config.enable_headers,
        }
    }
}

/// Request body buffered by the gate, made available to later stages.
#[derive(Debug, Clone)]
pub struct BufferedBody(pub Bytes);

pub struct SecurityGate {
    policy: SecurityPolicy,
}

impl SecurityGate {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self { policy }
    }

    /// Add hardening headers and strip server fingerprints.
    pub fn harden(&self, headers: &mut HeaderMap) {
        headers.remove(header::SERVER);
        headers.remove("x-powered-by");
        if !self.policy.enable_headers {
            return;
        }
        for (name, value) in HARDENING_HEADERS {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    /// Run checks 2–5. On success the request comes back with its body
    /// buffered (and a [`BufferedBody`] copy in the extensions).
    pub async fn inspect(&self, request: Request, scope: RouteScope) -> Result<Request, ApiError> {
        if scope.requires_api_key() && !self.policy.allowed_api_keys.is_empty() {
            self.check_api_key(request.headers(), request.method(), request.uri().path())?;
        }

        self.check_declared_length(request.headers())?;
        check_content_type(request.method(), request.headers(), self.policy.allowed_content_type)?;

        let (mut parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, self.policy.max_body_size)
            .await
            .map_err(|_| {
                tracing::warn!("Request body exceeded limit while reading");
                ApiError::PayloadTooLarge {
                    max_size: self.policy.max_body_size,
                }
            })?;

        let haystack = scan_text(parts.uri.query(), &bytes);
        if self.is_suspicious(&haystack) {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                "Suspicious request pattern detected"
            );
            return Err(ApiError::InvalidInput {
                message: "Invalid request format".into(),
                details: None,
            });
        }

        parts.extensions.insert(BufferedBody(bytes.clone()));
        Ok(Request::from_parts(parts, Body::from(bytes)))
    }

    fn check_api_key(&self, headers: &HeaderMap, method: &Method, path: &str) -> Result<(), ApiError> {
        let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) else {
            tracing::warn!(method = %method, path = %path, "Missing API key");
            return Err(ApiError::Unauthorized("API key required".into()));
        };

        if !self.policy.allowed_api_keys.contains(key) {
            let prefix: String = key.chars().take(8).collect();
            tracing::warn!(key_prefix = %prefix, "Invalid API key used");
            return Err(ApiError::Forbidden("Invalid API key".into()));
        }
        Ok(())
    }

    fn check_declared_length(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if declared > self.policy.max_body_size {
            tracing::warn!(content_length = declared, "Request body too large");
            return Err(ApiError::PayloadTooLarge {
                max_size: self.policy.max_body_size,
            });
        }
        Ok(())
    }

    pub fn is_suspicious(&self, text: &str) -> bool {
        self.policy
            .injection_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }
}

fn check_content_type(method: &Method, headers: &HeaderMap, allowed: &str) -> Result<(), ApiError> {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return Ok(());
    }
    match headers.get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap_or_default()) {
        Some(content_type) if !content_type.contains(allowed) => Err(ApiError::UnsupportedMediaType(
            format!("Only {} content type is supported", allowed),
        )),
        _ => Ok(()),
    }
}

/// Text the scan runs over: decoded `key=value` query pairs, then the keys
/// and scalar values of a JSON body (raw text if the body is not JSON).
/// JSON punctuation is left out so ordinary JSON bodies don't trip the
/// quote pattern.
pub fn scan_text(query: Option<&str>, body: &[u8]) -> String {
    let mut out = String::new();

    if let Some(query) = query {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            out.push_str(&k);
            out.push('=');
            out.push_str(&v);
            out.push('\n');
        }
    }

    if !body.is_empty() {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => collect_json_text(&value, &mut out),
            Err(_) => out.push_str(&String::from_utf8_lossy(body)),
        }
    }

    out
}

fn collect_json_text(value: &serde_json::Value, out: &mut String) {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                out.push_str(k);
                out.push('\n');
                collect_json_text(v, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_json_text(v, out)),
        Value::String(s) => {
            out.push_str(s);
            out.push('\n');
        }
        Value::Number(n) => {
            out.push_str(&n.to_string());
            out.push('\n');
        }
        Value::Bool(_) | Value::Null => {}
    }
}
