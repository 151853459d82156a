use crate::analytics::sink::EventSink;
use crate::model::AnalyticsError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PageView,
    UserAction,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    pub name: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(kind: EventKind, name: impl Into<String>, data: Value) -> Self {
        Self {
            kind,
            name: name.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// Usage-event session with an explicit lifecycle: `start`, `track`/`flush`, `stop`.
/// Events are queued and handed to the sink in batches.
pub struct AnalyticsSession<S: EventSink> {
    session_id: String,
    sink: S,
    queue: VecDeque<AnalyticsEvent>,
    batch_size: usize,
    state: SessionState,
}

impl<S: EventSink> AnalyticsSession<S> {
    pub fn new(sink: S, batch_size: usize) -> Self {
        Self {
            session_id: generate_session_id(),
            sink,
            queue: VecDeque::new(),
            batch_size: batch_size.max(1),
            state: SessionState::Idle,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn start(&mut self) {
        if self.state != SessionState::Idle {
            return;
        }
        self.state = SessionState::Running;
        info!("Analytics session {} started", self.session_id);
        self.queue.push_back(AnalyticsEvent::new(EventKind::PageView, "session_start", Value::Null));
    }

    pub async fn track(&mut self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        match self.state {
            SessionState::Idle => return Err(AnalyticsError::NotStarted),
            SessionState::Stopped => return Err(AnalyticsError::Stopped),
            SessionState::Running => {}
        }
        self.queue.push_back(event);
        if self.queue.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Sends every queued event. Undelivered events go back to the front of the queue.
    pub async fn flush(&mut self) -> Result<usize, AnalyticsError> {
        let mut sent = 0;
        while let Some(event) = self.queue.pop_front() {
            if let Err(e) = self.sink.send(&self.session_id, &event).await {
                warn!("Analytics flush failed after {} events: {}", sent, e);
                self.queue.push_front(event);
                return Err(e);
            }
            sent += 1;
        }
        Ok(sent)
    }

    /// Records the session end and flushes. Later `track` calls are rejected.
    pub async fn stop(&mut self) -> Result<(), AnalyticsError> {
        match self.state {
            SessionState::Stopped => return Ok(()),
            SessionState::Idle => {
                self.state = SessionState::Stopped;
                return Ok(());
            }
            SessionState::Running => {}
        }
        self.queue.push_back(AnalyticsEvent::new(EventKind::PageView, "session_end", Value::Null));
        self.state = SessionState::Stopped;
        self.flush().await?;
        info!("Analytics session {} stopped", self.session_id);
        Ok(())
    }

    pub async fn track_conversion(&mut self, from: &str, to: &str, amount: f64) -> Result<(), AnalyticsError> {
        let data = json!({ "from_currency": from, "to_currency": to, "amount": amount });
        self.track(AnalyticsEvent::new(EventKind::UserAction, "currency_conversion", data)).await
    }

    pub async fn track_alert_created(&mut self, alert_type: &str, currency: &str) -> Result<(), AnalyticsError> {
        let data = json!({ "alert_type": alert_type, "currency_code": currency });
        self.track(AnalyticsEvent::new(EventKind::UserAction, "alert_created", data)).await
    }

    pub async fn track_alert_modified(&mut self, alert_id: u64, currency: &str) -> Result<(), AnalyticsError> {
        let data = json!({ "alert_id": alert_id, "currency_code": currency });
        self.track(AnalyticsEvent::new(EventKind::UserAction, "alert_modified", data)).await
    }

    pub async fn track_analysis(&mut self, currency: &str, signals: usize) -> Result<(), AnalyticsError> {
        let data = json!({ "currency_code": currency, "signals": signals });
        self.track(AnalyticsEvent::new(EventKind::UserAction, "trend_analysis", data)).await
    }

    pub async fn track_error(&mut self, name: &str, message: &str) -> Result<(), AnalyticsError> {
        let data = json!({ "error_name": name, "error_message": message });
        self.track(AnalyticsEvent::new(EventKind::Error, name, data)).await
    }
}

/// `session_<epoch millis>_<9 base36 chars>`
fn generate_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}
