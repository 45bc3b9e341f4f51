//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the NetSuite endpoints
//! - Wire up the request pipeline and CORS
//! - Bind the server to a listener with connect info
//! - Run the rate-limit sweeper alongside the server
//! - Shut down gracefully on Ctrl+C, SIGTERM, or the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{CorsConfig, GatewayConfig};
use crate::http::handlers;
use crate::netsuite::{ExistenceValidator, NetSuiteResult, QueryBuilder, QueryExecutor, SuiteQlClient};
use crate::pipeline::{pipeline_middleware, Pipeline, API_PREFIX, X_CORRELATION_ID};
use crate::security::identity::API_KEY_HEADER;
use crate::security::rate_limit::{
    Clock, RateLimiter, SystemClock, LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<ExistenceValidator>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a server that talks to the configured NetSuite account.
    pub fn new(config: GatewayConfig) -> NetSuiteResult<Self> {
        let executor = Arc::new(SuiteQlClient::new(&config.netsuite)?);
        Ok(Self::with_executor(config, executor, Arc::new(SystemClock)))
    }

    /// Create a server over any query executor and clock.
    pub fn with_executor(
        config: GatewayConfig,
        executor: Arc<dyn QueryExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let limiter = Arc::new(RateLimiter::with_clock(&config.rate_limit, clock));
        let pipeline = Arc::new(Pipeline::new(&config, limiter.clone()));

        let validator = Arc::new(ExistenceValidator::new(
            executor,
            QueryBuilder::new(config.netsuite.subsidiary_id),
        ));
        let state = AppState { validator };

        let router = Self::build_router(&config, state, pipeline);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState, pipeline: Arc<Pipeline>) -> Router {
        let api = Router::new()
            .route("/customer/check", post(handlers::check_customer))
            .route("/customer/{email}/exists", get(handlers::customer_exists))
            .route("/contact/{email}/exists", get(handlers::contact_exists))
            .route("/health", get(handlers::health))
            .method_not_allowed_fallback(handlers::method_not_allowed);

        // The pipeline is outermost so CORS preflights are finalized too.
        Router::new()
            .nest(API_PREFIX, api)
            .fallback(handlers::not_found)
            .with_state(state)
            // The security gate enforces the configured body limit.
            .layer(DefaultBodyLimit::disable())
            .layer(cors_layer(&config.cors))
            .layer(from_fn_with_state(pipeline, pipeline_middleware))
    }

    /// A clone of the fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a signal arrives or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.config.environment,
            "HTTP server starting"
        );

        let sweeper = self
            .config
            .rate_limit
            .enabled
            .then(|| self.limiter.clone().spawn_sweeper(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
            X_CORRELATION_ID,
        ])
        .expose_headers([
            X_CORRELATION_ID,
            HeaderName::from_static(LIMIT_HEADER),
            HeaderName::from_static(REMAINING_HEADER),
            HeaderName::from_static(RESET_HEADER),
        ]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.recv() => {},
    }
    tracing::info!("Shutdown signal received");
}
