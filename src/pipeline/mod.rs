//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → correlation.rs (reuse or mint X-Correlation-ID)
//!     → security::gate (API key, size, content type, pattern scan)
//!     → security::rate_limit (fixed window per caller)
//!     → observability::logging (request line, redacted body)
//!     → handler
//!     → observability::logging (status, duration) + metrics
//!     → finalize (correlation header, hardening headers, rate headers, error body)
//! ```
//!
//! # Design Decisions
//! - A failing stage short-circuits: later stages and the handler never run
//! - Every response is finalized, including rejections
//! - Errors are rendered here, where path and method are known

pub mod correlation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::http::response::ApiError;
use crate::observability::{metrics, RequestLogger};
use crate::security::gate::{BufferedBody, SecurityGate, SecurityPolicy};
use crate::security::identity::ClientIdentity;
use crate::security::rate_limit::{RateLimitDecision, RateLimiter};

pub use correlation::{CorrelationId, X_CORRELATION_ID};

pub const API_PREFIX: &str = "/api/netsuite";
pub const HEALTH_PATH: &str = "/api/netsuite/health";

/// Which controls apply to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    /// Outside the API prefix.
    Public,
    /// Under the API prefix; API key and rate limit apply.
    Protected,
    /// The health probe.
    Health,
}

impl RouteScope {
    pub fn classify(path: &str) -> Self {
        let path = path.trim_end_matches('/');
        if path == HEALTH_PATH {
            RouteScope::Health
        } else if path == API_PREFIX || path.starts_with(&format!("{}/", API_PREFIX)) {
            RouteScope::Protected
        } else {
            RouteScope::Public
        }
    }

    /// Scope for a whole request. CORS preflights carry no credentials, so
    /// they are treated as public wherever they point.
    pub fn of(request: &Request) -> Self {
        if is_preflight(request) {
            RouteScope::Public
        } else {
            Self::classify(request.uri().path())
        }
    }

    pub fn requires_api_key(self) -> bool {
        self == RouteScope::Protected
    }

    pub fn is_rate_limited(self) -> bool {
        self == RouteScope::Protected
    }
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Request metadata captured before the request is consumed.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub user_agent: String,
    pub peer: Option<SocketAddr>,
    pub correlation_id: CorrelationId,
}

impl RequestContext {
    pub fn from_request(request: &Request, correlation_id: CorrelationId) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            user_agent: request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string(),
            peer: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            correlation_id,
        }
    }

    pub fn client_ip(&self) -> String {
        self.peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// The composed stages, shared by every request.
pub struct Pipeline {
    gate: SecurityGate,
    limiter: Arc<RateLimiter>,
    logger: RequestLogger,
    rate_limit_enabled: bool,
    expose_details: bool,
}

impl Pipeline {
    pub fn new(config: &GatewayConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            gate: SecurityGate::new(SecurityPolicy::from_config(&config.security)),
            limiter,
            logger: RequestLogger::new(),
            rate_limit_enabled: config.rate_limit.enabled,
            expose_details: !config.is_production(),
        }
    }

    /// Run the request through every stage and the handler.
    pub async fn run(&self, request: Request, next: Next) -> Response {
        let ctx = RequestContext::from_request(&request, CorrelationId::resolve(request.headers()));
        let span = tracing::info_span!(
            "request",
            correlation_id = %ctx.correlation_id,
            method = %ctx.method,
            path = %ctx.path,
        );

        self.process(request, next, ctx).instrument(span).await
    }

    async fn process(&self, mut request: Request, next: Next, ctx: RequestContext) -> Response {
        let start = Instant::now();
        let scope = RouteScope::of(&request);
        request.extensions_mut().insert(ctx.correlation_id.clone());

        let mut decision = None;
        let response = match self.admit(request, scope, &ctx, &mut decision).await {
            Ok(request) => next.run(request).await,
            Err(err) => err.into_response(),
        };

        let response = self.finalize(response, &ctx, decision);
        self.logger.log_response(&ctx, response.status(), start.elapsed());
        metrics::record_request(ctx.method.as_str(), response.status().as_u16(), start);
        response
    }

    /// Security, rate limit, then the request log line.
    async fn admit(
        &self,
        request: Request,
        scope: RouteScope,
        ctx: &RequestContext,
        decision: &mut Option<RateLimitDecision>,
    ) -> Result<Request, ApiError> {
        let request = self.gate.inspect(request, scope).await?;

        if self.rate_limit_enabled && scope.is_rate_limited() {
            let identity = ClientIdentity::from_parts(request.headers(), ctx.peer);
            let outcome = self.limiter.check(&identity);
            *decision = Some(outcome);
            enforce(&outcome)?;
        }

        let body = (scope == RouteScope::Protected && ctx.method != Method::GET)
            .then(|| request.extensions().get::<BufferedBody>())
            .flatten();
        self.logger.log_request(ctx, body.map(|b| b.0.as_ref()));

        Ok(request)
    }

    fn finalize(
        &self,
        mut response: Response,
        ctx: &RequestContext,
        decision: Option<RateLimitDecision>,
    ) -> Response {
        if let Some(err) = response.extensions_mut().remove::<ApiError>() {
            response = err.render(ctx.method.as_str(), &ctx.path, self.expose_details);
        } else if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Unhandled handler failure");
        }

        let headers = response.headers_mut();
        if let Some(value) = ctx.correlation_id.header_value() {
            headers.insert(X_CORRELATION_ID, value);
        }
        self.gate.harden(headers);
        if let Some(decision) = decision {
            decision.apply_headers(headers);
        }
        response
    }
}

/// Turn a rejected decision into a 429.
fn enforce(decision: &RateLimitDecision) -> Result<(), ApiError> {
    if decision.allowed {
        return Ok(());
    }
    Err(ApiError::RateLimited {
        retry_after_secs: decision.retry_after_secs.unwrap_or(1),
    })
}

/// Axum adapter for [`Pipeline::run`].
pub async fn pipeline_middleware(
    State(pipeline): State<Arc<Pipeline>>,
    request: Request,
    next: Next,
) -> Response {
    pipeline.run(request, next).await
}
