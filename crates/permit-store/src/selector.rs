//! Equality selectors for rich queries.
//!
//! A selector is a conjunction of top-level field equalities over a stored
//! JSON document, e.g. `{"docType": "permit", "status": "APPROVED"}`. Values
//! must be scalars. Values that are not JSON objects never match.

use serde_json::Value;

use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    fields: Vec<(String, Value)>,
}

impl Selector {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a `field == value` condition.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Check that every field name is a plain identifier and every value a
    /// scalar.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Query` naming the first offending field.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for (field, value) in &self.fields {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(LedgerError::Query(format!(
                    "selector field '{field}' must be [A-Za-z0-9_]+"
                )));
            }
            if value.is_object() || value.is_array() {
                return Err(LedgerError::Query(format!(
                    "selector value for '{field}' must be a scalar"
                )));
            }
        }
        Ok(())
    }

    /// Evaluate the selector against a decoded document.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(object) = doc.as_object() else {
            return false;
        };
        self.fields
            .iter()
            .all(|(field, expected)| object.get(field) == Some(expected))
    }
}
