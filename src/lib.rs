//! NetSuite existence-check gateway library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod netsuite;
pub mod observability;
pub mod pipeline;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
