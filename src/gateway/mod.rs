//! The conversion gateway: the remote service that performs the actual
//! byte-level conversion, seen from the client.
//!
//! The controller only depends on the [`ConversionGateway`] trait, so tests
//! and embedders can substitute an in-memory gateway. [`http::HttpGateway`]
//! is the real implementation speaking the multipart `/convert` protocol.
//!
//! ## Failure classification
//!
//! Every call ends in exactly one of three outcomes:
//!
//! | Outcome | Meaning | Task error |
//! |---------|---------|------------|
//! | `Ok(ConvertedFile)` | service returned the converted bytes | — |
//! | [`GatewayError::Unreachable`] | the request never got an answer | `ConnectionUnavailable` |
//! | [`GatewayError::Rejected`] | the service answered and declined | `ConversionRejected` |
//!
//! The split is decided where the transport error is observed, from its
//! kind, and drives whether the simulation fallback is offered.

pub mod http;

use crate::error::TaskError;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

pub use http::HttpGateway;

/// One conversion request: the file and the target format code.
#[derive(Clone)]
pub struct ConversionRequest {
    pub filename: String,
    pub payload: Bytes,
    /// Format code from the catalog, sent verbatim (e.g. `"DOCX"`).
    pub target_format: &'static str,
}

impl fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("filename", &self.filename)
            .field("payload_len", &self.payload.len())
            .field("target_format", &self.target_format)
            .finish()
    }
}

/// The converted bytes returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl ConvertedFile {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }
}

/// Typed failure of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request could not reach the service (refused, DNS, timeout).
    #[error("conversion service unreachable: {reason}")]
    Unreachable { reason: String },

    /// The service answered but declined the request.
    #[error("conversion rejected ({}): {}", status_text(.status), .message.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },
}

fn status_text(status: &Option<u16>) -> String {
    status
        .map(|s| format!("HTTP {s}"))
        .unwrap_or_else(|| "no status".to_string())
}

impl GatewayError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, GatewayError::Unreachable { .. })
    }
}

impl From<GatewayError> for TaskError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unreachable { .. } => TaskError::connection_unavailable(),
            GatewayError::Rejected { message, .. } => TaskError::conversion_rejected(message),
        }
    }
}

/// A remote endpoint that converts a file to a target format.
#[async_trait]
pub trait ConversionGateway: Send + Sync {
    /// Submit `request` and wait for the converted bytes.
    async fn convert(&self, request: ConversionRequest) -> Result<ConvertedFile, GatewayError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "gateway"
    }
}
