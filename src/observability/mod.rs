//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline and NetSuite client produce:
//!     → logging.rs (structured log events, redacted bodies)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Correlation ID is recorded on the request span, so every event inside
//!   a request carries it
//! - Secrets and sensitive body fields never reach the sink

pub mod logging;
pub mod metrics;

pub use logging::RequestLogger;
