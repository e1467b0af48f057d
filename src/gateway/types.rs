use serde::{Deserialize, Serialize};

/// One entry of the per-label probability breakdown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    #[serde(alias = "emotion")]
    pub label: String,
    #[serde(alias = "prob")]
    pub probability_percent: f64,
}

/// Sentiment analysis result as produced by the remote service.
///
/// `predicted_label` and `distribution` arrive together and are stored as-is.
/// The label is never recomputed from the distribution locally.
///
/// The service's own field names (`Predicted_Sentiment`, `cd`, `emotions`) are
/// accepted on decode; everything persisted uses the normalized names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(alias = "Predicted_Sentiment")]
    pub predicted_label: String,
    #[serde(alias = "cd")]
    pub confidence_percent: f64,
    #[serde(alias = "emotions", default)]
    pub distribution: Vec<DistributionEntry>,
}

impl AnalysisResult {
    /// The distribution entry matching the predicted label, if the service sent one.
    pub fn predicted_entry(&self) -> Option<&DistributionEntry> {
        self.distribution
            .iter()
            .find(|entry| entry.label == self.predicted_label)
    }
}

/// Document summary text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    #[serde(alias = "summary")]
    pub summary_text: String,
}
