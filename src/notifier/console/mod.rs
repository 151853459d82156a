pub mod command_handler;
pub mod listener;
pub mod sender;

use crate::analytics::{AnalyticsSession, LogSink};
use crate::config::AppConfig;
use crate::model::{AlertEvent, CurrencyReport, NotifyError};
use crate::storage::MemoryStorage;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};

/// Delivers reports and alerts to the terminal and serves console commands.
pub struct ConsoleNotifier {
    pub storage: Arc<Mutex<MemoryStorage>>,
    pub analytics: Arc<Mutex<AnalyticsSession<LogSink>>>,
    pub config: Arc<AppConfig>,
    pub start_time: Instant,
    pub refresh_notify: Arc<Notify>,
}

impl ConsoleNotifier {
    pub fn new(
        storage: Arc<Mutex<MemoryStorage>>,
        analytics: Arc<Mutex<AnalyticsSession<LogSink>>>,
        config: Arc<AppConfig>,
        refresh_notify: Arc<Notify>,
    ) -> Self {
        Self {
            storage,
            analytics,
            config,
            start_time: Instant::now(),
            refresh_notify,
        }
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(text).await
    }

    pub async fn notify_report(&self, report: &CurrencyReport) -> Result<(), NotifyError> {
        sender::send_report(report).await
    }

    pub async fn notify_alert(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        sender::send_alert(event).await
    }

    pub fn spawn_listener(notifier: Arc<ConsoleNotifier>) {
        tokio::spawn(async move {
            tracing::info!("▶️ Starting console listener...");
            if let Err(e) = listener::listen_for_commands(&notifier).await {
                tracing::warn!("Console listener failed: {}", e);
            }
            tracing::info!("🛑 Console listener ended.");
        });
    }
}
