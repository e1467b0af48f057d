pub mod provider;
pub mod http;
pub mod types;

pub use http::HttpGateway;
pub use provider::{AnalysisGateway, GatewayError, GatewayErrorKind};
pub use types::{AnalysisResult, DistributionEntry, SummaryResult};
