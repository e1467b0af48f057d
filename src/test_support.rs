//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::core::attachment::AttachmentDescriptor;
use crate::core::session::{MemoryStorage, SessionStore};
use crate::core::state::App;
use crate::gateway::{
    AnalysisGateway, AnalysisResult, DistributionEntry, GatewayError, SummaryResult,
};

/// A gateway that answers every call with a fixed response and counts calls.
pub struct ScriptedGateway {
    pub analysis: Result<AnalysisResult, GatewayError>,
    pub summary: Result<SummaryResult, GatewayError>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(
        analysis: Result<AnalysisResult, GatewayError>,
        summary: Result<SummaryResult, GatewayError>,
    ) -> Self {
        Self {
            analysis,
            summary,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with the same error.
    pub fn failing(error: GatewayError) -> Self {
        Self::new(Err(error.clone()), Err(error))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new(Ok(joy_result()), Ok(key_points_summary()))
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn analyze_text(&self, _text: &str) -> Result<AnalysisResult, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.clone()
    }

    async fn analyze_document(
        &self,
        _attachment: &AttachmentDescriptor,
    ) -> Result<AnalysisResult, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.clone()
    }

    async fn summarize_document(
        &self,
        _attachment: &AttachmentDescriptor,
    ) -> Result<SummaryResult, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.summary.clone()
    }
}

pub fn joy_result() -> AnalysisResult {
    AnalysisResult {
        predicted_label: "joy".into(),
        confidence_percent: 91.0,
        distribution: vec![
            DistributionEntry {
                label: "joy".into(),
                probability_percent: 91.0,
            },
            DistributionEntry {
                label: "neutral".into(),
                probability_percent: 9.0,
            },
        ],
    }
}

pub fn key_points_summary() -> SummaryResult {
    SummaryResult {
        summary_text: "Key Points:\n- Revenue up\n- Costs down".into(),
    }
}

/// Creates a test App over in-memory storage.
pub fn test_app_with(gateway: Arc<dyn AnalysisGateway>) -> App {
    App::new(gateway, SessionStore::init(Box::new(MemoryStorage::new())))
}

/// Creates a test App with the default ScriptedGateway.
pub fn test_app() -> App {
    test_app_with(Arc::new(ScriptedGateway::default()))
}
