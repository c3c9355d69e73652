//! Error Types
//!
//! This module defines the error taxonomy for the broker.
//!
//! # Error Categories
//!
//! - `BackendError` - failures talking to a remote pad-hosting service
//! - `BrokerError` - failures in the directory and lifecycle layers
//!
//! Remote "not found" conditions are normalized by the adapters themselves:
//! delete operations report success when the desired end-state already holds,
//! so `NotFound` only surfaces from operations that genuinely need the
//! resource to exist.
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread
//! boundaries.

use thiserror::Error;

/// Errors raised by a backend adapter while talking to its remote service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or HTTP-level failure reaching the remote service
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// The remote service answered but rejected the operation
    #[error("remote rejected {operation}: {message}")]
    Remote {
        /// The API operation that was rejected
        operation: String,
        /// The remote's own error message
        message: String,
    },

    /// A resource the operation requires does not exist remotely
    #[error("not found on remote: {what}")]
    NotFound {
        /// Description of the missing resource
        what: String,
    },

    /// Malformed adapter configuration, detected at construction time
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human-readable error message
        message: String,
    },
}

impl BackendError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new remote-rejection error
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error is a remote-side rejection rather than a
    /// transport failure. Delete operations treat these as success.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::remote("decode", format!("malformed reply: {}", err))
    }
}

/// Errors raised by the directory and lifecycle layers.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The record already has a remote identity; assignment is a one-shot
    /// (raised for pads, groups and authors alike)
    #[error("'{name}' already has a remote identity")]
    AlreadyCreated {
        /// The record's local name
        name: String,
    },

    /// The operation needs a remote identity that has not been assigned yet
    #[error("{entity} has no remote identity yet")]
    MissingRemoteId {
        /// Which record is missing its remote id
        entity: String,
    },

    /// A local record the operation depends on is absent from the store
    #[error("no such record: {what}")]
    NoSuchRecord {
        /// Description of the missing record
        what: String,
    },
}

impl BrokerError {
    /// Create a new missing-remote-id error
    pub fn missing_remote_id(entity: impl Into<String>) -> Self {
        Self::MissingRemoteId {
            entity: entity.into(),
        }
    }

    /// Create a new no-such-record error
    pub fn no_such_record(what: impl Into<String>) -> Self {
        Self::NoSuchRecord { what: what.into() }
    }
}
