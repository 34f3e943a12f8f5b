//! Error types for the gedcheck library
//!
//! Integrity findings are *not* errors: the inspector returns them as
//! [`Problem`](crate::inspector::Problem) values. The errors defined here
//! cover the cases where an operation itself cannot proceed, such as a repair
//! whose record vanished since the scan, or a caller asking to repair a
//! diagnosis that has no repair path.

use crate::inspector::Diagnosis;
use crate::types::{RecordType, XRef};
use thiserror::Error;

/// Type alias for Results in the gedcheck library
pub type Result<T> = std::result::Result<T, GedcheckError>;

/// Main error type for all gedcheck operations
#[derive(Debug, Error)]
pub enum GedcheckError {
    /// I/O errors while loading snapshots or configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The record no longer resolves in the graph
    #[error("Record not found: {0}")]
    RecordNotFound(XRef),

    /// A record with the same XRef is already present
    #[error("Duplicate record identifier: {0}")]
    DuplicateXRef(XRef),

    /// A record was resolved but has a different type than required
    #[error("Record {xref} is a {actual} record, expected {expected}")]
    RecordTypeMismatch {
        /// Identifier of the offending record
        xref: XRef,
        /// Type the operation needed
        expected: RecordType,
        /// Type actually stored under the identifier
        actual: RecordType,
    },

    /// Repair was requested for a diagnosis without a repair path
    #[error("Diagnosis {0:?} has no repair action")]
    NotRepairable(Diagnosis),

    /// The repair could not be applied to the current graph state
    #[error("Repair of {xref} failed: {reason}")]
    RepairFailed {
        /// Subject of the failed repair
        xref: XRef,
        /// Why the repair was refused
        reason: String,
    },

    /// Invalid inspection configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A date value that cannot be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl GedcheckError {
    /// Create a repair failure for the given subject
    pub fn repair_failed(xref: &XRef, reason: impl Into<String>) -> Self {
        GedcheckError::RepairFailed {
            xref: xref.clone(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the graph changed since the scan
    ///
    /// Stale problems are expected while working through a batch of repairs
    /// (an earlier repair may have removed a record a later problem refers to).
    pub fn is_stale(&self) -> bool {
        matches!(self, GedcheckError::RecordNotFound(_))
    }

    /// Check if this error is a programming error on the caller's side
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GedcheckError::NotRepairable(_) | GedcheckError::RecordTypeMismatch { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            GedcheckError::RecordNotFound(xref) => {
                format!("Record '{}' no longer exists. Re-run the scan to refresh the problem list.", xref)
            }
            GedcheckError::NotRepairable(diag) => {
                format!(
                    "Problems of kind {:?} are informational and need a manual decision.",
                    diag
                )
            }
            GedcheckError::InvalidConfiguration(msg) => {
                format!("Invalid inspection settings: {}. Check the thresholds file.", msg)
            }
            _ => self.to_string(),
        }
    }
}
