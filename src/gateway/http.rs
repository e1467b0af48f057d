//! HTTP implementation of the analysis gateway.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /api/analyze_sms` with JSON `{ "text": ... }`
//! - `POST /api/analyze_document` with multipart field `file`
//! - `POST /api/summarize_document` with multipart fields `file` and `question`

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::provider::{AnalysisGateway, GatewayError};
use super::types::{AnalysisResult, SummaryResult};
use crate::core::attachment::AttachmentDescriptor;

pub const DEFAULT_SUMMARIZE_QUESTION: &str = "Summarize the key points of this document.";

#[derive(Serialize, Debug)]
struct AnalyzeTextRequest<'a> {
    text: &'a str,
}

/// Analysis service reached over HTTP (no auth).
pub struct HttpGateway {
    base_url: String,
    summarize_question: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            summarize_question: DEFAULT_SUMMARIZE_QUESTION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Overrides the fixed `question` field sent with summarize requests.
    pub fn with_summarize_question(mut self, question: impl Into<String>) -> Self {
        self.summarize_question = question.into();
        self
    }

    /// Applies a transport timeout to every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(e) => warn!("Failed to build HTTP client with timeout, keeping default: {}", e),
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Reads the attachment from its source path into a multipart `file` part.
    async fn file_part(attachment: &AttachmentDescriptor) -> Result<Part, GatewayError> {
        let path = attachment.source.as_ref().ok_or_else(|| {
            GatewayError::Attachment(format!("{} is no longer available", attachment.name))
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GatewayError::Attachment(format!("{}: {}", attachment.name, e)))?;
        debug!("Read attachment {} ({} bytes)", attachment.name, bytes.len());

        Part::bytes(bytes)
            .file_name(attachment.name.clone())
            .mime_str(&attachment.mime_hint)
            .map_err(|e| GatewayError::Attachment(e.to_string()))
    }

    /// Sends a prepared request and decodes a JSON body, mapping every failure
    /// mode onto a [`GatewayError`] kind.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} response status: {}", endpoint, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} returned {}: {}", endpoint, status.as_u16(), body);
            return Err(GatewayError::BadStatus {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("{} returned undecodable body: {}", endpoint, e);
            GatewayError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl AnalysisGateway for HttpGateway {
    fn name(&self) -> &str {
        "http"
    }

    async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, GatewayError> {
        let endpoint = self.endpoint("analyze_sms");
        info!("Analyze text request: {} chars", text.chars().count());
        let request = self
            .client
            .post(&endpoint)
            .json(&AnalyzeTextRequest { text });
        self.execute(request, &endpoint).await
    }

    async fn analyze_document(
        &self,
        attachment: &AttachmentDescriptor,
    ) -> Result<AnalysisResult, GatewayError> {
        let endpoint = self.endpoint("analyze_document");
        info!("Analyze document request: {}", attachment.name);
        let form = Form::new().part("file", Self::file_part(attachment).await?);
        let request = self.client.post(&endpoint).multipart(form);
        self.execute(request, &endpoint).await
    }

    async fn summarize_document(
        &self,
        attachment: &AttachmentDescriptor,
    ) -> Result<SummaryResult, GatewayError> {
        let endpoint = self.endpoint("summarize_document");
        info!("Summarize document request: {}", attachment.name);
        let form = Form::new()
            .part("file", Self::file_part(attachment).await?)
            .text("question", self.summarize_question.clone());
        let request = self.client.post(&endpoint).multipart(form);
        self.execute(request, &endpoint).await
    }
}
