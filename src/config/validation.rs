//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks the values make
//! sense before the gateway accepts them. All errors are collected rather
//! than stopping at the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// Longest accepted rate-limit window (one day).
pub const MAX_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is not configured")]
    Missing(&'static str),

    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let ns = &config.netsuite;

    if ns.base_url.trim().is_empty() {
        errors.push(ValidationError::Missing("netsuite.base_url"));
    } else if let Err(e) = url::Url::parse(&ns.base_url) {
        errors.push(ValidationError::Invalid {
            field: "netsuite.base_url",
            reason: e.to_string(),
        });
    }

    let credentials = [
        ("netsuite.consumer_key", &ns.consumer_key),
        ("netsuite.consumer_secret", &ns.consumer_secret),
        ("netsuite.access_token", &ns.access_token),
        ("netsuite.token_secret", &ns.token_secret),
        ("netsuite.realm", &ns.realm),
    ];
    for (field, value) in credentials {
        if value.trim().is_empty() {
            errors.push(ValidationError::Missing(field));
        }
    }

    if ns.timeout_secs == 0 {
        errors.push(ValidationError::Invalid {
            field: "netsuite.timeout_secs",
            reason: "must be greater than zero".into(),
        });
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::Invalid {
            field: "rate_limit.max_requests",
            reason: "must be greater than zero".into(),
        });
    }
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::Invalid {
            field: "rate_limit.window_ms",
            reason: "must be greater than zero".into(),
        });
    } else if config.rate_limit.window_ms > MAX_WINDOW_MS {
        errors.push(ValidationError::Invalid {
            field: "rate_limit.window_ms",
            reason: format!("must be at most {} (one day)", MAX_WINDOW_MS),
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Invalid {
            field: "security.max_body_size",
            reason: "must be greater than zero".into(),
        });
    }

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::Invalid {
            field: "listener.bind_address",
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
