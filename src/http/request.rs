//! Request payloads.
//!
//! Bodies are parsed from the bytes the security gate already buffered, so
//! parsing is a pure function and easy to test in isolation.

use serde::Deserialize;
use serde_json::json;

use crate::http::response::ApiError;
use crate::netsuite::query::is_valid_email;

/// Body of `POST /customer/check`. Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerCheckRequest {
    pub company_email: String,
}

/// Decode and validate a customer-check body.
pub fn parse_and_validate(body: &[u8]) -> Result<CustomerCheckRequest, ApiError> {
    if body.is_empty() {
        return Err(invalid("Request body is required", "companyEmail should not be empty"));
    }

    let request: CustomerCheckRequest = serde_json::from_slice(body)
        .map_err(|e| invalid("Invalid request body", &e.to_string()))?;

    let email = request.company_email.trim();
    if email.is_empty() {
        return Err(invalid("Invalid request body", "companyEmail should not be empty"));
    }
    if !is_valid_email(email) {
        return Err(invalid("Invalid email format", "companyEmail must be an email"));
    }

    Ok(CustomerCheckRequest {
        company_email: email.to_string(),
    })
}

fn invalid(message: &str, detail: &str) -> ApiError {
    ApiError::InvalidInput {
        message: message.to_string(),
        details: Some(json!({ "validation": [detail] })),
    }
}
