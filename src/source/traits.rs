use crate::model::{HistoryRequest, SourceError};

/// Anything that can hand over raw rate payloads.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_history(&self, req: &HistoryRequest) -> Result<String, SourceError>;
    async fn fetch_latest(&self) -> Result<String, SourceError>;
}
