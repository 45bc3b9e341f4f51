//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → gate.rs (API key, body size, content type, pattern scan)
//!     → identity.rs (derive the caller key)
//!     → rate_limit.rs (fixed window per caller)
//!     → Pass to logging and the handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input; the query builder escapes independently

pub mod gate;
pub mod identity;
pub mod rate_limit;

pub use gate::{SecurityGate, SecurityPolicy};
pub use identity::ClientIdentity;
pub use rate_limit::{Clock, MockClock, RateLimiter, SystemClock};
