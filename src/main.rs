mod analytics;
mod analyzer;
mod config;
mod model;
mod normalizer;
mod notifier;
mod parser;
mod source;
mod storage;
mod utils;

use analytics::{AnalyticsSession, LogSink};
use analyzer::{Analyzer, AnalyzerImpl, MarketAnalyzer};
use chrono::Utc;
use config::{load_config, AppConfig, CurrencyConfig};
use futures::future::join_all;
use model::{CurrencyReport, HistoryRequest, SourceError};
use normalizer::normalize_all;
use notifier::ConsoleNotifier;
use parser::{Parser, RatePayloadParser};
use source::{FileRateSource, RateSource};
use std::sync::Arc;
use storage::MemoryStorage;
use tokio::sync::{Mutex, Notify};
use tokio::time::{interval, sleep, Duration, Interval};
use tracing::{debug, error, info, warn};

type SharedAnalytics = Arc<Mutex<AnalyticsSession<LogSink>>>;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let source = FileRateSource::new(&config.data_dir);
    let parser = RatePayloadParser::new();
    let analyzer = AnalyzerImpl::new();

    let storage = Arc::new(Mutex::new(MemoryStorage::new()));
    {
        let mut guard = storage.lock().await;
        for alert in &config.alerts {
            if let Err(e) = guard.alerts_mut().create(alert.clone()) {
                warn!("Skipping configured alert '{}': {}", alert.name, e);
            }
        }
    }

    let analytics: SharedAnalytics = Arc::new(Mutex::new(AnalyticsSession::new(
        LogSink,
        config.analytics.batch_size,
    )));
    analytics.lock().await.start();

    let refresh_notify = Arc::new(Notify::new());
    let notifier = Arc::new(ConsoleNotifier::new(
        storage.clone(),
        analytics.clone(),
        config.clone(),
        refresh_notify.clone(),
    ));

    // Commands typed on stdin, e.g. /refresh or /convert
    ConsoleNotifier::spawn_listener(notifier.clone());

    if let Err(e) = notifier.notify_text("🚀 fx-sentinel started! Type /help for commands.").await {
        warn!("Startup notification failed: {:?}", e);
    }

    // Ctrl-C leaves a permit behind, so a signal during a pass stops the next wait
    let shutdown = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => shutdown.notify_one(),
                Err(e) => error!("Ctrl-C handler failed: {}", e),
            }
        });
    }

    let mut flush_tick = interval(Duration::from_secs(config.analytics.flush_interval_seconds.max(1)));

    loop {
        info!("Currencies to process: {}", config.currencies.len());

        refresh_quotes(&source, &parser, storage.clone(), &config).await;

        let tasks: Vec<_> = config
            .currencies
            .iter()
            .map(|currency_cfg| {
                process_currency(
                    currency_cfg,
                    &source,
                    &parser,
                    &analyzer,
                    storage.clone(),
                    config.clone(),
                    notifier.clone(),
                    analytics.clone(),
                )
            })
            .collect();
        join_all(tasks).await;

        let next_pass = wait_for_next_pass(
            Duration::from_secs(config.check_interval_seconds),
            &refresh_notify,
            &shutdown,
            &mut flush_tick,
            &analytics,
        )
        .await;
        if !next_pass {
            break;
        }
    }

    if let Err(e) = analytics.lock().await.stop().await {
        warn!("Analytics session did not stop cleanly: {}", e);
    }
    info!("fx-sentinel stopped.");
}

/// Loads the latest bank quotes and maps them onto configured currencies.
async fn refresh_quotes(
    source: &impl RateSource,
    parser: &RatePayloadParser,
    storage: Arc<Mutex<MemoryStorage>>,
    config: &AppConfig,
) {
    let payload = match source.fetch_latest().await {
        Ok(p) => p,
        Err(SourceError::NotFound(path)) => {
            debug!("No latest quotes at {}", path);
            return;
        }
        Err(e) => {
            warn!("Quote source error: {}", e);
            return;
        }
    };

    let mut quotes = match parser.parse_latest(&payload) {
        Ok(q) => q,
        Err(e) => {
            warn!("Quote parse error: {}", e);
            return;
        }
    };
    normalize_all(&mut quotes, &config.currencies);
    let kept = storage.lock().await.save_quotes(quotes);
    info!("Loaded {} latest quotes", kept);
}

/// Loads, analyzes and reports one currency, then evaluates its alert rules.
#[allow(clippy::too_many_arguments)]
async fn process_currency(
    currency_cfg: &CurrencyConfig,
    source: &impl RateSource,
    parser: &RatePayloadParser,
    analyzer: &AnalyzerImpl,
    storage: Arc<Mutex<MemoryStorage>>,
    config: Arc<AppConfig>,
    notifier: Arc<ConsoleNotifier>,
    analytics: SharedAnalytics,
) {
    let code = currency_cfg.code.to_uppercase();
    info!("Processing currency: {}", code);

    let request = HistoryRequest {
        currency_code: code.clone(),
        window_days: Some(currency_cfg.window_days),
    };

    let payload = match source.fetch_history(&request).await {
        Ok(p) => p,
        Err(e) => {
            warn!("History source error for {}: {}", code, e);
            track_failure(&analytics, "source_error", &e.to_string()).await;
            return;
        }
    };

    let series = match parser.parse_history(&payload, request.window_days) {
        Ok(s) => s,
        Err(e) => {
            warn!("History parse error for {}: {}", code, e);
            track_failure(&analytics, "parse_error", &e.to_string()).await;
            return;
        }
    };
    info!("{}: {} observations in a {}-day window", code, series.len(), currency_cfg.window_days);

    let signals = match analyzer.analyze(&series, &config.analysis) {
        Ok(s) => s,
        Err(e) => {
            error!("Analysis rejected for {}: {}", code, e);
            return;
        }
    };

    let latest = series.last().copied();
    let previous = series.len().checked_sub(2).map(|i| series[i].value);
    let change = latest.and_then(|l| analyzer.period_change(l.value, previous));

    let report = CurrencyReport {
        code: code.clone(),
        name: currency_cfg.name.clone(),
        window_days: currency_cfg.window_days,
        latest,
        change,
        change_class: MarketAnalyzer::classify_change(change, config.change_coloring),
        extremes: MarketAnalyzer::extremes(&series),
        signals,
        generated_at: Utc::now(),
    };

    if let Err(e) = notifier.notify_report(&report).await {
        warn!("Report delivery failed for {}: {:?}", code, e);
    }

    let fired = {
        let mut guard = storage.lock().await;
        guard.save_report(report.clone());
        guard.alerts_mut().evaluate(&code, &series)
    };
    info!("{}: {} signals, {} alerts fired", code, report.signals.len(), fired.len());

    for event in &fired {
        if let Err(e) = notifier.notify_alert(event).await {
            warn!("Alert delivery failed: {:?}", e);
        }
    }

    if let Err(e) = analytics.lock().await.track_analysis(&code, report.signals.len()).await {
        warn!("Analytics error: {}", e);
    }

    info!("Finished processing currency: {}", code);
}

/// Sleeps until the next pass is due. Returns `false` once shutdown was requested.
async fn wait_for_next_pass(
    period: Duration,
    refresh_notify: &Notify,
    shutdown: &Notify,
    flush_tick: &mut Interval,
    analytics: &SharedAnalytics,
) -> bool {
    info!("Waiting for timer ({}s) or manual refresh...", period.as_secs());
    let wait = sleep(period);
    tokio::pin!(wait);
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("Shutdown requested.");
                return false;
            }
            _ = &mut wait => {
                info!("Timer triggered.");
                return true;
            }
            _ = refresh_notify.notified() => {
                info!("Manual refresh triggered.");
                return true;
            }
            _ = flush_tick.tick() => {
                if let Err(e) = analytics.lock().await.flush().await {
                    warn!("Analytics flush failed: {}", e);
                }
            }
        }
    }
}

async fn track_failure(analytics: &SharedAnalytics, name: &str, message: &str) {
    if let Err(e) = analytics.lock().await.track_error(name, message).await {
        warn!("Analytics error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analytics() -> SharedAnalytics {
        Arc::new(Mutex::new(AnalyticsSession::new(LogSink, 10)))
    }

    #[tokio::test]
    async fn shutdown_during_a_pass_ends_the_next_wait() {
        let refresh = Notify::new();
        let shutdown = Notify::new();
        let mut flush_tick = interval(Duration::from_secs(3600));
        // the signal lands while no wait is running
        shutdown.notify_one();
        let next = tokio::time::timeout(
            Duration::from_secs(1),
            wait_for_next_pass(Duration::from_secs(3600), &refresh, &shutdown, &mut flush_tick, &analytics()),
        )
        .await
        .unwrap();
        assert!(!next);
    }

    #[tokio::test]
    async fn refresh_and_timer_start_another_pass() {
        let refresh = Notify::new();
        let shutdown = Notify::new();
        let mut flush_tick = interval(Duration::from_secs(3600));
        let shared = analytics();

        refresh.notify_one();
        assert!(wait_for_next_pass(Duration::from_secs(3600), &refresh, &shutdown, &mut flush_tick, &shared).await);
        assert!(wait_for_next_pass(Duration::from_millis(10), &refresh, &shutdown, &mut flush_tick, &shared).await);
    }
}
