//! Error types for the typeshift library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TypeShiftError`] is **returned**: the call itself could not be carried
//!   out (file unreadable, operation invalid in the current state, artifact
//!   already consumed). Returned as `Err(TypeShiftError)` from the library.
//!
//! * [`TaskError`] is **recorded**: the conversion task reached a stable
//!   failure state (gateway offline, service declined the request). Stored
//!   inside [`crate::task::TaskSnapshot`] so the caller can render it and
//!   offer a retry, change of format, or the simulation fallback.
//!
//! A failed conversion is not an `Err`: the controller stays usable and the
//! snapshot carries the reason.

use crate::task::TaskStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Message shown when a file's extension has no catalog entry.
pub const UNSUPPORTED_TYPE_MESSAGE: &str =
    "Unsupported file type. Please upload PDF, DOCX, CSV, Excel, or Images.";

/// Message shown when the conversion service could not be reached.
pub const CONNECTION_UNAVAILABLE_MESSAGE: &str = "Backend server is not reachable.";

/// Fallback message when the service declined without a `detail`.
pub const GENERIC_REJECTION_MESSAGE: &str = "Conversion failed";

/// All errors returned by the typeshift library.
#[derive(Debug, Error)]
pub enum TypeShiftError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Workflow errors ───────────────────────────────────────────────────
    /// The operation is not permitted in the task's current state.
    #[error("Cannot {operation} while the task is {status}")]
    InvalidState {
        operation: &'static str,
        status: TaskStatus,
    },

    /// The selected file's extension has no registered target formats.
    #[error("Unsupported file type: '{filename}'")]
    UnsupportedType { filename: String },

    /// The requested target format is not offered for the current file.
    #[error("'{format}' is not a valid target for .{source_ext} files")]
    UnknownTarget { format: String, source_ext: String },

    /// An outstanding request finished after the task was reset or replaced.
    ///
    /// The late result was discarded; the current snapshot is unaffected.
    #[error("Task was reset while the request was outstanding; result discarded")]
    Superseded,

    // ── Artifact errors ───────────────────────────────────────────────────
    /// No artifact is available (the task has not succeeded).
    #[error("No converted artifact is available")]
    NoArtifact,

    /// The artifact handle was already retrieved once.
    #[error("Artifact '{filename}' was already retrieved")]
    ArtifactConsumed { filename: String },

    /// Could not create, read or persist the artifact's temporary file.
    #[error("Artifact I/O failed for '{path}': {source}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of a recorded task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// The chosen file's extension has no catalog entry.
    UnsupportedType,
    /// The gateway could not be reached; the simulation fallback is offered.
    ConnectionUnavailable,
    /// The gateway was reached but declined the request.
    ConversionRejected,
}

/// A non-fatal error recorded on the conversion task.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct TaskError {
    pub kind: TaskErrorKind,
    pub message: String,
}

impl TaskError {
    pub fn unsupported_type() -> Self {
        Self {
            kind: TaskErrorKind::UnsupportedType,
            message: UNSUPPORTED_TYPE_MESSAGE.to_string(),
        }
    }

    pub fn connection_unavailable() -> Self {
        Self {
            kind: TaskErrorKind::ConnectionUnavailable,
            message: CONNECTION_UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    /// A rejection carrying the service message, or the generic one when the
    /// service gave none (or an empty one).
    pub fn conversion_rejected(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_REJECTION_MESSAGE.to_string());
        Self {
            kind: TaskErrorKind::ConversionRejected,
            message,
        }
    }

    /// Whether the simulation fallback should be offered for this error.
    pub fn offers_simulation(&self) -> bool {
        self.kind == TaskErrorKind::ConnectionUnavailable
    }
}
