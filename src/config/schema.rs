//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// NetSuite SuiteQL endpoint and OAuth credentials.
    pub netsuite: NetSuiteConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security gate settings.
    pub security: SecurityConfig,

    /// Cross-origin access.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Deployment environment ("production" hides diagnostic detail).
    pub environment: Environment,
}

impl GatewayConfig {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "test" => Ok(Environment::Development),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3333").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3333".to_string(),
        }
    }
}

/// NetSuite integration settings.
///
/// The four credential values and the realm are required; the gateway
/// refuses to start without them.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetSuiteConfig {
    /// SuiteQL base URL, e.g. `https://<account>.suitetalk.api.netsuite.com/services/rest/query/v1`.
    pub base_url: String,

    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub token_secret: String,

    /// OAuth realm (the NetSuite account id).
    pub realm: String,

    /// Subsidiary the customer lookup is constrained to.
    pub subsidiary_id: u32,

    /// Hard deadline for a single SuiteQL call in seconds.
    pub timeout_secs: u64,
}

impl Default for NetSuiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            token_secret: String::new(),
            realm: String::new(),
            subsidiary_id: 2,
            timeout_secs: 30,
        }
    }
}

// Credentials must never reach the logs, including through `{:?}`.
impl std::fmt::Debug for NetSuiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetSuiteConfig")
            .field("base_url", &self.base_url)
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .field("realm", &self.realm)
            .field("subsidiary_id", &self.subsidiary_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per client per window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_ms: 60_000,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable hardening response headers.
    pub enable_headers: bool,
    /// Allowed API keys. Empty disables API-key checks.
    pub api_keys: Vec<String>,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            api_keys: Vec::new(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Cross-origin resource sharing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Pretty output for development, JSON for log shipping.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.netsuite.subsidiary_id, 2);
        assert_eq!(config.netsuite.timeout_secs, 30);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.security.max_body_size, 1_048_576);
        assert!(config.security.api_keys.is_empty());
        assert!(!config.is_production());
    }

    #[test]
    fn test_partial_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            environment = "production"

            [netsuite]
            base_url = "https://1234.suitetalk.api.netsuite.com/services/rest/query/v1"
            subsidiary_id = 7

            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.netsuite.subsidiary_id, 7);
        assert_eq!(config.netsuite.timeout_secs, 30);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_ms, 60_000);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = NetSuiteConfig::default();
        config.consumer_secret = "super-secret-value".into();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
