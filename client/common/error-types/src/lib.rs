//! Unified error types for the Snapgram client
//!
//! Every call that crosses the backend boundary returns a [`ClientResult`],
//! so callers always see the failure case explicitly instead of an absent
//! value.
//!
//! # Taxonomy
//!
//! 1. **Validation**: form schema checks, raised before any network call
//! 2. **Backend**: network, authentication, not-found and other API failures
//! 3. **Configuration**: missing or malformed settings at startup
//! 4. **Session store**: the local session marker file is unreadable

use thiserror::Error;

pub mod validation;

pub use validation::{FieldError, ValidationError};

/// Boxed error used as an opaque source
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type used across the Snapgram client crates
#[derive(Debug, Error)]
pub enum ClientError {
    /// Form or argument validation failed
    #[error("{source}")]
    Validation {
        #[from]
        source: ValidationError,
    },

    /// No active session, or the session was rejected
    #[error("Authentication required")]
    Unauthenticated,

    /// Resource not found
    #[error("Resource not found: {resource} {id}")]
    NotFound { resource: &'static str, id: String },

    /// Backend answered with a non-success status
    #[error("{service} request failed with status {status}: {message}")]
    Backend {
        service: &'static str,
        status: u16,
        kind: Option<String>,
        message: String,
    },

    /// Request never produced a response
    #[error("{service} is unreachable")]
    Network {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// Response body could not be decoded
    #[error("Unexpected response from {service}")]
    Decode {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// Client misconfiguration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Local session marker could not be read or written
    #[error("Session marker unavailable")]
    SessionStore {
        #[from]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Build a not-found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Map an HTTP status and error body to the matching variant
    pub fn from_status(
        service: &'static str,
        status: u16,
        kind: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthenticated,
            404 => Self::NotFound {
                resource: service,
                id: message,
            },
            _ => Self::Backend {
                service,
                status,
                kind,
                message,
            },
        }
    }

    /// True when the failure means there is no usable session
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// True when the failure was caught before any network call
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Log error with appropriate level and context
    pub fn log(&self) {
        match self {
            Self::Validation { .. } | Self::NotFound { .. } => {
                tracing::debug!(error = %self, "Client error");
            }
            Self::Unauthenticated => {
                tracing::info!(error = %self, "No active session");
            }
            Self::Backend { .. }
            | Self::Network { .. }
            | Self::Decode { .. }
            | Self::SessionStore { .. } => {
                tracing::warn!(error = ?self, "Backend call failed");
            }
            Self::Configuration { .. } => {
                tracing::error!(error = %self, "Configuration error");
            }
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation {
            source: ValidationError::from(errors),
        }
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
