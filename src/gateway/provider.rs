use std::fmt;

use async_trait::async_trait;

use super::types::{AnalysisResult, SummaryResult};
use crate::core::attachment::AttachmentDescriptor;

/// Coarse classification of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Network,
    BadStatus,
    Decode,
    Attachment,
}

/// Errors surfaced by the analysis service boundary.
/// Every failure is reported once; the gateway never retries.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Connection refused, DNS, timeout, or the body could not be read.
    Network(String),
    /// The service answered with a non-2xx status.
    BadStatus { status: u16, message: String },
    /// The body was not the JSON shape we expected.
    Decode(String),
    /// The attached file could not be read from disk for upload.
    Attachment(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Network(_) => GatewayErrorKind::Network,
            GatewayError::BadStatus { .. } => GatewayErrorKind::BadStatus,
            GatewayError::Decode(_) => GatewayErrorKind::Decode,
            GatewayError::Attachment(_) => GatewayErrorKind::Attachment,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Network(msg) => write!(f, "network error: {msg}"),
            GatewayError::BadStatus { status, message } if message.is_empty() => {
                write!(f, "HTTP error (status {status})")
            }
            GatewayError::BadStatus { status, message } => {
                write!(f, "HTTP error (status {status}): {message}")
            }
            GatewayError::Decode(msg) => write!(f, "could not decode response: {msg}"),
            GatewayError::Attachment(msg) => write!(f, "could not read attachment: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// The three operations the remote analysis service offers.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Returns the name of the gateway, for logging.
    fn name(&self) -> &str;

    /// Sentiment analysis of free text.
    async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, GatewayError>;

    /// Sentiment analysis of an uploaded document.
    async fn analyze_document(
        &self,
        attachment: &AttachmentDescriptor,
    ) -> Result<AnalysisResult, GatewayError>;

    /// Summary of an uploaded document.
    async fn summarize_document(
        &self,
        attachment: &AttachmentDescriptor,
    ) -> Result<SummaryResult, GatewayError>;
}
