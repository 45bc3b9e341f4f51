//! Client for the NetSuite existence-check gateway.

mod client;

pub use client::{ErrorBody, ExistenceFlags, ExistsResponse, GatewayClient, HealthResponse, ValidationVerdict};
