//! Signed SuiteQL client with timeout and error classification.
//!
//! # Responsibilities
//! - Sign each query with OAuth 1.0a (HMAC-SHA256)
//! - POST `{"q": ...}` to the SuiteQL endpoint with `Prefer: transient`
//! - Enforce a hard deadline per call; never retry
//! - Classify failures (refused, timeout, HTTP status, decode)

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::config::NetSuiteConfig;
use crate::netsuite::oauth::{OAuthSigner, SigningCredentials};
use crate::netsuite::types::{LookupKind, NetSuiteError, NetSuiteResult, QueryResult};
use crate::observability::metrics;

/// Executes a SuiteQL query and returns the raw result.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, kind: LookupKind, query: &str) -> NetSuiteResult<QueryResult>;
}

#[derive(Serialize)]
struct SuiteQlRequest<'a> {
    q: &'a str,
}

/// SuiteQL client signing every request with token-based authentication.
#[derive(Debug, Clone)]
pub struct SuiteQlClient {
    http: Client,
    endpoint: Url,
    signer: OAuthSigner,
    timeout_secs: u64,
}

impl SuiteQlClient {
    /// Create a client from the NetSuite section of the configuration.
    pub fn new(config: &NetSuiteConfig) -> NetSuiteResult<Self> {
        let endpoint = suiteql_endpoint(&config.base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NetSuiteError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            endpoint = %endpoint,
            timeout_secs = config.timeout_secs,
            "SuiteQL client initialized"
        );

        Ok(Self {
            http,
            endpoint,
            signer: OAuthSigner::new(SigningCredentials::from_config(config)),
            timeout_secs: config.timeout_secs,
        })
    }

    async fn send(&self, query: &str) -> NetSuiteResult<QueryResult> {
        let authorization = self.signer.authorization_header("POST", &self.endpoint)?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "transient")
            .json(&SuiteQlRequest { q: query })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                url = %self.endpoint,
                "NetSuite API error"
            );
            return Err(NetSuiteError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body).map_err(|e| NetSuiteError::Decode(e.to_string()))
    }

    fn classify(&self, error: reqwest::Error) -> NetSuiteError {
        if error.is_timeout() {
            NetSuiteError::Timeout(self.timeout_secs)
        } else if is_connection_refused(&error) {
            NetSuiteError::Unavailable
        } else {
            NetSuiteError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl QueryExecutor for SuiteQlClient {
    async fn execute(&self, kind: LookupKind, query: &str) -> NetSuiteResult<QueryResult> {
        let start = Instant::now();
        tracing::debug!(lookup = kind.as_str(), query = %query, "Executing SuiteQL query");

        let result = self.send(query).await;

        match &result {
            Ok(r) => {
                tracing::debug!(lookup = kind.as_str(), count = r.count, "SuiteQL query result");
                metrics::record_upstream_query(kind.as_str(), "ok", start);
            }
            Err(e) => {
                tracing::error!(lookup = kind.as_str(), error = %e, "SuiteQL query failed");
                metrics::record_upstream_query(kind.as_str(), "error", start);
            }
        }
        result
    }
}

/// `<base_url>/suiteql`, tolerating a trailing slash on the base.
pub fn suiteql_endpoint(base_url: &str) -> NetSuiteResult<Url> {
    let joined = format!("{}/suiteql", base_url.trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|e| NetSuiteError::Config(format!("invalid base URL '{}': {}", base_url, e)))
}

fn is_connection_refused(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = err.source();
    }
    false
}
