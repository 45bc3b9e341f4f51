//! SuiteQL wire types, verdicts and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw SuiteQL response body. Only `count` drives decisions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResult {
    pub count: u64,
    pub has_more: bool,
    pub items: Vec<serde_json::Value>,
    pub links: Vec<serde_json::Value>,
    pub offset: u64,
    pub total_results: u64,
}

impl QueryResult {
    /// Whether the query matched at least one record.
    pub fn has_match(&self) -> bool {
        self.count > 0
    }
}

/// Which lookup a query belongs to; used for logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Customer,
    Contact,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Customer => "customer",
            LookupKind::Contact => "contact",
        }
    }
}

/// Both existence flags reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceFlags {
    pub customer_exists: bool,
    pub contact_exists: bool,
}

/// The reduced outcome of a customer/contact validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExistenceFlags>,
}

/// Body of `GET .../{email}/exists`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
    pub email: String,
}

/// Errors raised while building or executing SuiteQL queries.
#[derive(Debug, Clone, Error)]
pub enum NetSuiteError {
    /// The email failed the address shape check.
    #[error("Invalid email format")]
    InvalidEmail,

    /// NetSuite refused the connection.
    #[error("NetSuite service unavailable")]
    Unavailable,

    /// The request hit its hard deadline.
    #[error("NetSuite request timeout after {0} seconds")]
    Timeout(u64),

    /// NetSuite answered with a non-2xx status.
    #[error("NetSuite returned status {status}")]
    Upstream { status: u16, body: String },

    /// Any other transport-level failure.
    #[error("NetSuite request failed: {0}")]
    Transport(String),

    /// The response body did not match the SuiteQL shape.
    #[error("Unexpected NetSuite response: {0}")]
    Decode(String),

    /// Signing or client construction failed.
    #[error("NetSuite client misconfigured: {0}")]
    Config(String),
}

impl NetSuiteError {
    /// Upstream or network failures, as opposed to local input/decoding problems.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NetSuiteError::Unavailable
                | NetSuiteError::Timeout(_)
                | NetSuiteError::Upstream { .. }
                | NetSuiteError::Transport(_)
        )
    }
}

/// Result type for NetSuite operations.
pub type NetSuiteResult<T> = Result<T, NetSuiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_tolerates_missing_fields() {
        let result: QueryResult =
            serde_json::from_str(r#"{"count": 1, "items": [{"entityid": "ACME"}]}"#).unwrap();
        assert!(result.has_match());
        assert!(!result.has_more);
        assert_eq!(result.total_results, 0);
    }

    #[test]
    fn test_verdict_omits_absent_fields() {
        let verdict = ValidationVerdict {
            success: true,
            message: Some("ok".into()),
            error: None,
            data: Some(ExistenceFlags {
                customer_exists: false,
                contact_exists: false,
            }),
        };
        let json = serde_json::to_value(&verdict).unwrap();

        assert!(json.get("error").is_none());
        assert_eq!(json["data"]["customerExists"], false);
        assert_eq!(json["data"]["contactExists"], false);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(NetSuiteError::Unavailable.to_string(), "NetSuite service unavailable");
        assert_eq!(
            NetSuiteError::Timeout(30).to_string(),
            "NetSuite request timeout after 30 seconds"
        );
        assert!(NetSuiteError::Upstream { status: 401, body: String::new() }.is_transport());
        assert!(!NetSuiteError::Decode("eof".into()).is_transport());
    }
}
