//! Contract error types for the asset inventory
//!
//! These errors are transport-agnostic; the REST layer maps them to
//! Problem Details responses.

use thiserror::Error;

/// Asset inventory domain errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Category, table, field, asset or user not found
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (category, table, field, asset, user)
        resource: String,
        /// Resource identifier
        id: String,
    },
    /// Duplicate field, category or user
    #[error("Conflict: {reason}")]
    Conflict { reason: String },
    /// Malformed or incomplete input
    #[error("Validation error: {message}")]
    Validation { message: String },
    /// Missing or invalid credentials
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },
    /// Authenticated but not allowed
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },
    /// Storage or other unexpected failure
    #[error("Internal error")]
    Internal,
}

impl InventoryError {
    pub fn not_found(resource: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Log a storage failure and collapse it into `Internal`
    pub fn internal(context: &str, error: anyhow::Error) -> Self {
        tracing::error!(error = ?error, "{context}");
        Self::Internal
    }
}
