//! Route handlers.
//!
//! Handlers only see requests the pipeline admitted. They return
//! [`ApiError`] for failures and leave rendering to the pipeline.

use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::http::request::parse_and_validate;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::netsuite::validator::failure_verdict;
use crate::netsuite::{ExistsResponse, ValidationVerdict};

/// `POST /customer/check`
///
/// A completed check answers 200 even when a customer or contact already
/// exists. Upstream failures surface as 502/504; anything else the
/// validator reports becomes a failure verdict.
pub async fn check_customer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ValidationVerdict>, ApiError> {
    let request = parse_and_validate(&body)?;

    match state.validator.check(&request.company_email).await {
        Ok(verdict) => Ok(Json(verdict)),
        Err(e) if e.is_transport() => Err(e.into()),
        Err(e) => Ok(Json(failure_verdict(&e))),
    }
}

/// `GET /customer/{email}/exists`
pub async fn customer_exists(
    State(state): State<AppState>,
    email: Result<Path<String>, PathRejection>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let Path(email) = email?;
    let exists = state.validator.customer_exists(&email).await?;
    Ok(Json(ExistsResponse { exists, email }))
}

/// `GET /contact/{email}/exists`
pub async fn contact_exists(
    State(state): State<AppState>,
    email: Result<Path<String>, PathRejection>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let Path(email) = email?;
    let exists = state.validator.contact_exists(&email).await?;
    Ok(Json(ExistsResponse { exists, email }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: crate::http::timestamp(),
    })
}

/// Unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

/// Known routes with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".into())
}
