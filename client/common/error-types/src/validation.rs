//! Validation error types
//!
//! Structured validation errors with field-level details, produced by the
//! form schemas before any backend call is made.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Validation error with field-level details
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[error("Validation failed: {message}")]
pub struct ValidationError {
    /// High-level validation message
    pub message: String,

    /// Field-specific errors
    pub field_errors: HashMap<String, Vec<FieldError>>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    /// Add a field error
    pub fn add_field_error(
        mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(FieldError {
                code: code.into(),
                message: message.into(),
            });
        self
    }

    /// Check if validation has any field errors
    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    /// Total number of field errors
    pub fn error_count(&self) -> usize {
        self.field_errors.values().map(Vec::len).sum()
    }

    /// Errors for one field, empty when the field passed
    pub fn errors_for(&self, field: &str) -> &[FieldError] {
        self.field_errors
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Individual field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Error code (e.g. "length", "email")
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = ValidationError::new("Invalid form input");
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                out = out.add_field_error(field.to_string(), error.code.to_string(), message);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_field_error_groups_by_field() {
        let err = ValidationError::new("Validation failed")
            .add_field_error("email", "email", "Invalid email")
            .add_field_error("password", "length", "Too short")
            .add_field_error("password", "required", "Required");

        assert!(err.has_errors());
        assert_eq!(err.error_count(), 3);
        assert_eq!(err.errors_for("password").len(), 2);
        assert!(err.errors_for("name").is_empty());
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new("bad input");
        assert_eq!(err.to_string(), "Validation failed: bad input");
    }
}
