//! NetSuite integration subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → validator.rs (issue customer + contact checks, join both)
//!     → query.rs (shape check, quote escaping, SuiteQL template)
//!     → client.rs (sign via oauth.rs, POST /suiteql, classify failures)
//!     → validator.rs (reduce to ValidationVerdict)
//! ```
//!
//! # Design Decisions
//! - NetSuite is a read-only oracle here: no caching, no retries
//! - Every call has a hard deadline; timeouts surface immediately
//! - Credentials never appear in logs

pub mod client;
pub mod oauth;
pub mod query;
pub mod types;
pub mod validator;

pub use client::{QueryExecutor, SuiteQlClient};
pub use query::QueryBuilder;
pub use types::{
    ExistenceFlags, ExistsResponse, LookupKind, NetSuiteError, NetSuiteResult, QueryResult,
    ValidationVerdict,
};
pub use validator::ExistenceValidator;
