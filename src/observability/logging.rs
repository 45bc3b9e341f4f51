//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (pretty or JSON)
//! - Log request metadata and redacted bodies
//! - Log response status and duration at a severity matching the status
//!
//! Logging never gates a request: every function here is infallible.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::pipeline::RequestContext;

pub const MASK: &str = "***MASKED***";

/// Top-level body fields that are never logged verbatim.
pub const SENSITIVE_FIELDS: [&str; 5] = ["password", "token", "secret", "key", "authorization"];

/// Install the global tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "netsuite_gateway={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

/// Copy of a JSON body with sensitive top-level fields masked.
pub fn redact_body(body: &Value) -> Value {
    let mut redacted = body.clone();
    if let Value::Object(map) = &mut redacted {
        for field in SENSITIVE_FIELDS {
            if let Some(value) = map.get_mut(field) {
                *value = Value::String(MASK.to_string());
            }
        }
    }
    redacted
}

/// Request/response logger used by the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log_request(&self, ctx: &RequestContext, body: Option<&[u8]>) {
        tracing::info!(
            method = %ctx.method,
            path = %ctx.path,
            client_ip = %ctx.client_ip(),
            user_agent = %ctx.user_agent,
            "[REQUEST]"
        );

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            tracing::debug!(body = %body_for_log(body), "[REQUEST BODY]");
        }
    }

    pub fn log_response(&self, ctx: &RequestContext, status: StatusCode, elapsed: Duration) {
        let duration_ms = elapsed.as_millis() as u64;
        let status = status.as_u16();

        if status >= 400 {
            tracing::error!(method = %ctx.method, path = %ctx.path, status, duration_ms, "[RESPONSE]");
        } else if status >= 300 {
            tracing::warn!(method = %ctx.method, path = %ctx.path, status, duration_ms, "[RESPONSE]");
        } else {
            tracing::info!(method = %ctx.method, path = %ctx.path, status, duration_ms, "[RESPONSE]");
        }
    }
}

/// Render a body for the log sink. Non-JSON bodies are summarized, never
/// echoed, since they cannot be redacted field by field.
pub fn body_for_log(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => redact_body(&value).to_string(),
        Err(_) => format!("<{} bytes, not JSON>", body.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sensitive_fields_masked() {
        let body = json!({
            "companyEmail": "a@b.com",
            "password": "hunter2",
            "token": "t",
            "secret": {"nested": true},
            "key": 42,
            "authorization": "Bearer x"
        });

        let redacted = redact_body(&body);
        for field in SENSITIVE_FIELDS {
            assert_eq!(redacted[field], MASK, "{field} should be masked");
        }
        assert_eq!(redacted["companyEmail"], "a@b.com");
    }

    #[test]
    fn test_matching_is_exact_and_top_level() {
        let body = json!({"Password": "x", "api_key": "y", "nested": {"password": "z"}});
        let redacted = redact_body(&body);

        assert_eq!(redacted["Password"], "x");
        assert_eq!(redacted["api_key"], "y");
        assert_eq!(redacted["nested"]["password"], "z");
    }

    #[test]
    fn test_password_never_rendered() {
        let rendered = body_for_log(br#"{"companyEmail":"a@b.com","password":"hunter2"}"#);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains(MASK));

        let rendered = body_for_log(b"password=hunter2");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_non_object_bodies_unchanged() {
        assert_eq!(redact_body(&json!([1, 2])), json!([1, 2]));
        assert_eq!(redact_body(&json!("password")), json!("password"));
    }
}
