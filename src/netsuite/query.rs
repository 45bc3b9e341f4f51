//! SuiteQL query construction.
//!
//! Queries are rendered as text, not bound parameters. Two steps keep the
//! interpolated email inert and both must stay: the address shape check and
//! doubling of single quotes.

use std::sync::LazyLock;

use regex::Regex;

use crate::netsuite::types::{NetSuiteError, NetSuiteResult};

// `local@domain.tld`; the pattern is a constant so compilation cannot fail.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Builds the customer and contact existence queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    subsidiary_id: u32,
}

impl QueryBuilder {
    pub fn new(subsidiary_id: u32) -> Self {
        Self { subsidiary_id }
    }

    /// Customer lookup, restricted to the configured primary subsidiary.
    pub fn customer_query(&self, email: &str) -> NetSuiteResult<String> {
        let email = self.sanitize(email)?;
        Ok(format!(
            "SELECT Customer.entityid \
             FROM Customer \
             INNER JOIN CustomerSubsidiaryRelationship \
             ON Customer.id = CustomerSubsidiaryRelationship.entity \
             WHERE Customer.email = '{}' \
             AND CustomerSubsidiaryRelationship.subsidiary = {} \
             AND CustomerSubsidiaryRelationship.isprimarysub = 'T'",
            email, self.subsidiary_id
        ))
    }

    /// Contact lookup by email.
    pub fn contact_query(&self, email: &str) -> NetSuiteResult<String> {
        let email = self.sanitize(email)?;
        Ok(format!(
            "SELECT Contact.entityId FROM Contact WHERE Contact.email = '{}'",
            email
        ))
    }

    fn sanitize(&self, email: &str) -> NetSuiteResult<String> {
        if !is_valid_email(email) {
            return Err(NetSuiteError::InvalidEmail);
        }
        Ok(email.replace('\'', "''"))
    }
}

/// Address shape check shared with request parsing.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}
