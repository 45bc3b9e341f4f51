//! Customer/contact existence validation.
//!
//! Both lookups are issued before either is awaited and the reduction only
//! runs once both have finished, so the reported flags are always complete
//! and the verdict does not depend on which leg returns first.

use std::sync::Arc;

use crate::netsuite::client::QueryExecutor;
use crate::netsuite::query::QueryBuilder;
use crate::netsuite::types::{
    ExistenceFlags, LookupKind, NetSuiteError, NetSuiteResult, ValidationVerdict,
};

pub const CUSTOMER_EXISTS: &str = "Customer already exists in NetSuite";
pub const CONTACT_EXISTS: &str = "Contact already exists in NetSuite";
pub const NO_MATCH: &str = "No existing customer or contact found";

/// Runs the two existence checks and reduces them to a verdict.
#[derive(Clone)]
pub struct ExistenceValidator {
    executor: Arc<dyn QueryExecutor>,
    queries: QueryBuilder,
}

impl ExistenceValidator {
    pub fn new(executor: Arc<dyn QueryExecutor>, queries: QueryBuilder) -> Self {
        Self { executor, queries }
    }

    /// Whether a customer with this email exists in the configured subsidiary.
    pub async fn customer_exists(&self, email: &str) -> NetSuiteResult<bool> {
        let query = self.queries.customer_query(email)?;
        let result = self.executor.execute(LookupKind::Customer, &query).await;
        if let Err(e) = &result {
            tracing::error!(email = %email, error = %e, "Error checking customer existence");
        }
        Ok(result?.has_match())
    }

    /// Whether a contact with this email exists.
    pub async fn contact_exists(&self, email: &str) -> NetSuiteResult<bool> {
        let query = self.queries.contact_query(email)?;
        let result = self.executor.execute(LookupKind::Contact, &query).await;
        if let Err(e) = &result {
            tracing::error!(email = %email, error = %e, "Error checking contact existence");
        }
        Ok(result?.has_match())
    }

    /// Run both checks and reduce them; any failure becomes a failure verdict.
    pub async fn validate(&self, email: &str) -> ValidationVerdict {
        self.check(email)
            .await
            .unwrap_or_else(|e| failure_verdict(&e))
    }

    /// Like [`validate`](Self::validate) but hands the error back so callers
    /// can tell upstream failures apart from business outcomes.
    pub async fn check(&self, email: &str) -> NetSuiteResult<ValidationVerdict> {
        tracing::info!(email = %email, "Validating customer and contact");

        let (customer, contact) = tokio::join!(self.customer_exists(email), self.contact_exists(email));

        Ok(reduce(customer?, contact?))
    }
}

/// Customer takes precedence over contact.
pub fn reduce(customer_exists: bool, contact_exists: bool) -> ValidationVerdict {
    if customer_exists {
        return ValidationVerdict {
            success: false,
            message: None,
            error: Some(CUSTOMER_EXISTS.to_string()),
            data: Some(ExistenceFlags {
                customer_exists: true,
                contact_exists,
            }),
        };
    }

    if contact_exists {
        return ValidationVerdict {
            success: false,
            message: None,
            error: Some(CONTACT_EXISTS.to_string()),
            data: Some(ExistenceFlags {
                customer_exists: false,
                contact_exists: true,
            }),
        };
    }

    ValidationVerdict {
        success: true,
        message: Some(NO_MATCH.to_string()),
        error: None,
        data: Some(ExistenceFlags {
            customer_exists: false,
            contact_exists: false,
        }),
    }
}

pub fn failure_verdict(error: &NetSuiteError) -> ValidationVerdict {
    tracing::error!(error = %error, "Error validating customer and contact");
    ValidationVerdict {
        success: false,
        message: None,
        error: Some(format!("An error occurred while querying NetSuite: {}", error)),
        data: None,
    }
}
