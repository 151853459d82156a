use crate::model::{HistoryRequest, SourceError};
use crate::source::traits::RateSource;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads rate payloads exported to a local directory:
/// `<root>/latest.json` and `<root>/history/<CODE>.json`.
#[derive(Debug, Clone)]
pub struct FileRateSource {
    root: PathBuf,
}

impl FileRateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn history_path(&self, req: &HistoryRequest) -> PathBuf {
        let code = req.currency_code.trim().to_uppercase();
        self.root.join("history").join(format!("{}.json", code))
    }

    fn latest_path(&self) -> PathBuf {
        self.root.join("latest.json")
    }

    async fn read(path: &Path) -> Result<String, SourceError> {
        debug!("Reading rate payload from {}", path.display());
        tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io(e),
        })
    }
}

#[async_trait::async_trait]
impl RateSource for FileRateSource {
    async fn fetch_history(&self, req: &HistoryRequest) -> Result<String, SourceError> {
        Self::read(&self.history_path(req)).await
    }

    async fn fetch_latest(&self) -> Result<String, SourceError> {
        Self::read(&self.latest_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("history")).unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_history_by_upper_case_code() {
        let dir = scratch_dir();
        std::fs::write(dir.path().join("history").join("USD.json"), "[]").unwrap();
        let source = FileRateSource::new(dir.path());
        let req = HistoryRequest { currency_code: "usd".into(), window_days: Some(30) };
        assert_eq!(source.fetch_history(&req).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = scratch_dir();
        let source = FileRateSource::new(dir.path());
        assert!(matches!(source.fetch_latest().await, Err(SourceError::NotFound(_))));
    }
}
