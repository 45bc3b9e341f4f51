//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, environment overlay, validation.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_with_env(path, |var| std::env::var(var).ok())
}

/// [`load`] with an explicit environment lookup.
pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests don't touch the process
/// environment. Unset and empty variables leave the current value alone.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("NS_SUITEQL_BASE_URL") {
        config.netsuite.base_url = v;
    }
    if let Some(v) = get("NS_CONSUMER_KEY") {
        config.netsuite.consumer_key = v;
    }
    if let Some(v) = get("NS_CONSUMER_SECRET") {
        config.netsuite.consumer_secret = v;
    }
    if let Some(v) = get("NS_ACCESS_TOKEN") {
        config.netsuite.access_token = v;
    }
    if let Some(v) = get("NS_TOKEN_SECRET") {
        config.netsuite.token_secret = v;
    }
    if let Some(v) = get("NS_OAUTH_REALM") {
        config.netsuite.realm = v;
    }
    if let Some(v) = get("NS_SUBSIDIARY_ID") {
        config.netsuite.subsidiary_id = parse_number("NS_SUBSIDIARY_ID", &v)?;
    }
    if let Some(v) = get("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_number("RATE_LIMIT_MAX", &v)?;
    }
    if let Some(v) = get("RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = parse_number("RATE_LIMIT_WINDOW_MS", &v)?;
    }
    if let Some(v) = get("ALLOWED_API_KEYS") {
        config.security.api_keys = split_list(&v);
    }
    if let Some(v) = get("MAX_BODY_SIZE") {
        config.security.max_body_size = parse_number("MAX_BODY_SIZE", &v)?;
    }
    if let Some(v) = get("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = split_list(&v);
    }
    if let Some(v) = get("PORT") {
        let port: u16 = parse_number("PORT", &v)?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(v) = get("GATEWAY_ENV") {
        config.environment = v
            .parse()
            .map_err(|reason| ConfigError::Env { var: "GATEWAY_ENV", reason })?;
    }

    Ok(())
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
