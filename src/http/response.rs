//! Error taxonomy and error response rendering.
//!
//! # Responsibilities
//! - Map gateway and upstream errors to HTTP status codes
//! - Render the uniform error body (status, timestamp, path, method, message)
//! - Include diagnostic detail only outside production
//!
//! Handlers return [`ApiError`] directly; its `IntoResponse` impl only tags
//! the response, and the pipeline renders the full body once it knows the
//! request path and method.

use axum::extract::rejection::PathRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::netsuite::NetSuiteError;
use crate::security::rate_limit::RETRY_AFTER_HEADER;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("{message}")]
    InvalidInput {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Request body too large")]
    PayloadTooLarge { max_size: usize },

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("{message}")]
    BadGateway {
        message: String,
        upstream_status: Option<u16>,
        upstream_body: Option<String>,
    },

    #[error("{0}")]
    GatewayTimeout(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fields always present alongside the message.
    fn public_fields(&self, body: &mut Map<String, Value>) {
        match self {
            ApiError::Unauthorized(_) => {
                body.insert("error".into(), json!("Unauthorized"));
            }
            ApiError::Forbidden(_) => {
                body.insert("error".into(), json!("Forbidden"));
            }
            ApiError::PayloadTooLarge { max_size } => {
                body.insert("maxSize".into(), json!(max_size));
            }
            ApiError::RateLimited { retry_after_secs } => {
                body.insert("retryAfter".into(), json!(retry_after_secs));
            }
            _ => {}
        }
    }

    /// Diagnostic fields, withheld in production.
    fn details(&self) -> Option<Value> {
        match self {
            ApiError::InvalidInput { details, .. } => details.clone(),
            ApiError::BadGateway {
                upstream_status,
                upstream_body,
                ..
            } => Some(json!({
                "service": "NetSuite",
                "upstreamStatus": upstream_status,
                "upstreamBody": upstream_body,
            })),
            ApiError::GatewayTimeout(_) => Some(json!({
                "service": "NetSuite",
                "issue": "Request timeout",
            })),
            _ => None,
        }
    }

    /// Full error response for a request.
    pub fn render(&self, method: &str, path: &str, expose_details: bool) -> Response {
        let status = self.status();

        let mut body = Map::new();
        body.insert("statusCode".into(), json!(status.as_u16()));
        body.insert("timestamp".into(), json!(crate::http::timestamp()));
        body.insert("path".into(), json!(path));
        body.insert("method".into(), json!(method));
        body.insert("message".into(), json!(self.to_string()));
        self.public_fields(&mut body);
        if expose_details {
            if let Some(details) = self.details() {
                body.insert("details".into(), details);
            }
        }

        let mut response = (status, Json(Value::Object(body))).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER_HEADER, HeaderValue::from(*retry_after_secs));
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<NetSuiteError> for ApiError {
    fn from(error: NetSuiteError) -> Self {
        match error {
            NetSuiteError::InvalidEmail => ApiError::invalid_input("Invalid email format"),
            NetSuiteError::Unavailable => ApiError::BadGateway {
                message: "NetSuite service unavailable".into(),
                upstream_status: None,
                upstream_body: None,
            },
            NetSuiteError::Timeout(_) => ApiError::GatewayTimeout("NetSuite request timeout".into()),
            NetSuiteError::Upstream { status, body } => ApiError::BadGateway {
                message: format!("Failed to execute NetSuite query: upstream returned {}", status),
                upstream_status: Some(status),
                upstream_body: Some(body),
            },
            NetSuiteError::Transport(msg) | NetSuiteError::Decode(msg) => ApiError::BadGateway {
                message: format!("Failed to execute NetSuite query: {}", msg),
                upstream_status: None,
                upstream_body: None,
            },
            NetSuiteError::Config(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_server_error() {
            ApiError::Internal(rejection.body_text())
        } else {
            ApiError::invalid_input(rejection.body_text())
        }
    }
}
