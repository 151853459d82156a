use crate::analytics::session::AnalyticsEvent;
use crate::model::AnalyticsError;
use tracing::info;

/// Destination for analytics events.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, session_id: &str, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait::async_trait]
impl EventSink for LogSink {
    async fn send(&self, session_id: &str, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let data = serde_json::to_string(&event.data).map_err(|e| AnalyticsError::Sink(e.to_string()))?;
        info!(
            session = session_id,
            kind = ?event.kind,
            at = %event.timestamp,
            "analytics event {}: {}",
            event.name,
            data
        );
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemorySink;

#[cfg(test)]
mod memory {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Inner {
        events: Vec<AnalyticsEvent>,
        remaining_before_failure: Option<usize>,
    }

    /// Records events in memory; can be told to start failing.
    #[derive(Clone, Default)]
    pub struct MemorySink {
        inner: Arc<Mutex<Inner>>,
    }

    impl MemorySink {
        pub fn events(&self) -> Vec<AnalyticsEvent> {
            self.inner.lock().unwrap().events.clone()
        }

        pub fn fail_after(&self, sends: usize) {
            self.inner.lock().unwrap().remaining_before_failure = Some(sends);
        }

        pub fn recover(&self) {
            self.inner.lock().unwrap().remaining_before_failure = None;
        }
    }

    #[async_trait::async_trait]
    impl EventSink for MemorySink {
        async fn send(&self, _session_id: &str, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
            let mut inner = self.inner.lock().unwrap();
            match inner.remaining_before_failure {
                Some(0) => return Err(AnalyticsError::Sink("sink offline".into())),
                Some(n) => inner.remaining_before_failure = Some(n - 1),
                None => {}
            }
            inner.events.push(event.clone());
            Ok(())
        }
    }
}
