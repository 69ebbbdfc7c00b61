//! Core error types for resv
//!
//! This module contains the main ResvError enum with all error variants
//! and the associated Result alias.

use thiserror::Error;

/// Error type for resv operations
///
/// Fatal variants (`Connection`, `Pattern`, `Config`) abort a run before
/// any VM is processed. The per-VM variants (`ConcurrentModification`,
/// `Transport`, `Validation`) are recorded in the run summary and do not
/// stop the remaining VMs from being processed.
#[derive(Error, Debug)]
pub enum ResvError {
    // Session Errors
    #[error("Connection to {host} failed: {details}")]
    Connection { host: String, details: String },

    #[error("Session error: {message}")]
    Session { message: String },

    // Per-VM Update Errors
    #[error("Concurrent modification of VM '{vm}': change version is stale")]
    ConcurrentModification { vm: String },

    #[error("Transport error during {operation}: {details}")]
    Transport { operation: String, details: String },

    #[error("Update rejected for VM '{vm}': {message}")]
    Validation { vm: String, message: String },

    #[error("Task '{task}' is no longer known to the service")]
    TaskLost { task: String },

    // Configuration & Input Errors
    #[error("Invalid VM name pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // Internal & Implementation Errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ResvError {
    /// Whether this error aborts a whole run rather than a single VM.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResvError::Connection { .. }
                | ResvError::Session { .. }
                | ResvError::Pattern { .. }
                | ResvError::Config { .. }
        )
    }
}

pub type ResvResult<T> = std::result::Result<T, ResvError>;
