// notifier/console/sender.rs

use crate::model::{AlertEvent, CurrencyReport, NotifyError};
use crate::notifier::render::{describe_alert, describe_report};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Writes a message to stdout.
pub async fn send_text(text: &str) -> Result<(), NotifyError> {
    let mut out = tokio::io::stdout();
    let line = format!("{}\n", text);
    let written = match out.write_all(line.as_bytes()).await {
        Ok(()) => out.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        warn!("❌ Console write failed: {}", e);
        return Err(NotifyError::Delivery(e.to_string()));
    }
    Ok(())
}

pub async fn send_report(report: &CurrencyReport) -> Result<(), NotifyError> {
    info!(
        currency = %report.code,
        signals = report.signals.len(),
        "📤 Publishing trend report"
    );
    send_text(&describe_report(report)).await
}

pub async fn send_alert(event: &AlertEvent) -> Result<(), NotifyError> {
    let message = describe_alert(event);
    info!("📤 Alert #{} fired for {}", event.rule_id, event.currency_code);
    send_text(&message).await
}
