//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, CORS, graceful shutdown)
//!     → pipeline (correlation, security, rate limit, logging)
//!     → handlers.rs (parse via request.rs, call the validator)
//!     → response.rs (error taxonomy and error bodies)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

use chrono::{SecondsFormat, Utc};

pub use response::ApiError;
pub use server::{AppState, HttpServer};

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
