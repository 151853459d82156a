// notifier/console/command_handler.rs

use crate::analyzer::converter::{convert, parse_amount, ConversionMode};
use crate::analyzer::MarketAnalyzer;
use crate::model::{AlertKind, NewAlert, ThresholdCondition, TrendAlert};
use crate::notifier::console::ConsoleNotifier;
use crate::notifier::render::{
    describe_alert, describe_conversion, describe_quote, describe_report, describe_rule,
};
use tracing::{info, warn};

const HELP: &str = "📋 Available commands:\n\
    /help — command list\n\
    /status — service status\n\
    /uptime — service uptime\n\
    /refresh — run the analysis now\n\
    /rates — latest quotes\n\
    /trend <CODE> — trend analysis for a currency\n\
    /convert <buy|sell> <CODE> <amount> — currency conversion\n\
    /alerts [CODE] — alert rules, optionally for one currency\n\
    /alert add threshold <CODE> <gte|lte> <value> <name>\n\
    /alert add trend <CODE> <new_low_30d|new_high_30d|drop_1p|rise_1p|drop_3d|rise_3d> <name>\n\
    /alert edit <id> threshold|trend ... — replace a rule\n\
    /alert del <id> — delete a rule\n\
    /alert on|off <id> — enable or disable a rule\n\
    /history — recently fired alerts";

const HISTORY_LIMIT: usize = 10;

/// Handles an incoming command and replies on the console.
pub async fn handle_command(command_text: &str, notifier: &ConsoleNotifier) {
    info!("Handling command: {}", command_text);
    let reply = respond(command_text, notifier).await;
    if let Err(e) = notifier.notify_text(&reply).await {
        warn!("{} reply error: {:?}", command_text, e);
    }
}

/// Runs a command and returns the reply text.
pub async fn respond(command_text: &str, notifier: &ConsoleNotifier) -> String {
    let parts: Vec<&str> = command_text.split_whitespace().collect();
    match parts.as_slice() {
        ["/help"] => HELP.to_string(),
        ["/status"] => {
            let session_id = notifier.analytics.lock().await.session_id().to_string();
            let storage = notifier.storage.lock().await;
            format!(
                "📊 Watching {} currencies | {} reports | {} quotes | {} alert rules | {}",
                notifier.config.currencies.len(),
                storage.all_reports().count(),
                storage.all_quotes().count(),
                storage.alerts().list().len(),
                session_id
            )
        }
        ["/uptime"] => {
            let uptime = notifier.start_time.elapsed();
            format!(
                "⏱ Uptime: {:02}:{:02}:{:02}",
                uptime.as_secs() / 3600,
                (uptime.as_secs() % 3600) / 60,
                uptime.as_secs() % 60
            )
        }
        ["/refresh"] => {
            info!("/refresh command received, triggering refresh...");
            notifier.refresh_notify.notify_one();
            "🔄 Refresh requested.".to_string()
        }
        ["/rates"] => {
            let storage = notifier.storage.lock().await;
            let lines: Vec<String> = storage
                .all_quotes()
                .map(|q| {
                    let class = MarketAnalyzer::classify_change(q.change, notifier.config.change_coloring);
                    describe_quote(q, class)
                })
                .collect();
            if lines.is_empty() {
                "📭 No quotes loaded yet.".to_string()
            } else {
                format!("💱 Latest quotes:\n{}", lines.join("\n"))
            }
        }
        ["/trend", code] => {
            let storage = notifier.storage.lock().await;
            let Some(report) = storage.get_report(code) else {
                return format!("📭 No analysis for {} yet.", code.to_uppercase());
            };
            let mut msg = describe_report(report);
            for rule in storage.alerts().list_for(code).filter(|r| r.active) {
                msg.push_str(&format!("\n🔔 {}", describe_rule(rule)));
            }
            msg
        }
        ["/convert", mode, code, amount] => convert_command(notifier, mode, code, amount).await,
        ["/alerts"] => {
            let storage = notifier.storage.lock().await;
            let lines: Vec<String> = storage.alerts().list().iter().map(describe_rule).collect();
            list_rules(lines)
        }
        ["/alerts", code] => {
            let storage = notifier.storage.lock().await;
            let lines: Vec<String> = storage.alerts().list_for(code).map(describe_rule).collect();
            list_rules(lines)
        }
        ["/alert", "add", spec @ ..] => match parse_alert(spec, true) {
            Ok(alert) => add_alert(notifier, alert).await,
            Err(reply) => reply,
        },
        ["/alert", "edit", id, spec @ ..] => {
            let Ok(id) = id.parse::<u64>() else {
                return format!("❌ '{}' is not an alert id.", id);
            };
            edit_alert(notifier, id, spec).await
        }
        ["/alert", "del", id] => {
            let Ok(id) = id.parse::<u64>() else {
                return format!("❌ '{}' is not an alert id.", id);
            };
            match notifier.storage.lock().await.alerts_mut().delete(id) {
                Ok(rule) => format!("🗑 Deleted {}", describe_rule(&rule)),
                Err(e) => format!("❌ {}", e),
            }
        }
        ["/alert", toggle @ ("on" | "off"), id] => {
            let Ok(id) = id.parse::<u64>() else {
                return format!("❌ '{}' is not an alert id.", id);
            };
            let result = {
                let mut storage = notifier.storage.lock().await;
                let alerts = storage.alerts_mut();
                alerts
                    .set_active(id, *toggle == "on")
                    .and_then(|_| alerts.get(id).cloned())
            };
            match result {
                Ok(rule) => {
                    let mut analytics = notifier.analytics.lock().await;
                    if let Err(e) = analytics.track_alert_modified(rule.id, &rule.currency_code).await {
                        warn!("Analytics error: {}", e);
                    }
                    format!("✅ {}", describe_rule(&rule))
                }
                Err(e) => format!("❌ {}", e),
            }
        }
        ["/history"] => {
            let storage = notifier.storage.lock().await;
            let events = storage.alerts().history(HISTORY_LIMIT);
            if events.is_empty() {
                "📭 No alerts fired yet.".to_string()
            } else {
                let lines: Vec<String> = events.into_iter().map(describe_alert).collect();
                lines.join("\n")
            }
        }
        _ => "🤖 Unknown command. Type /help for a list of commands.".to_string(),
    }
}

fn list_rules(lines: Vec<String>) -> String {
    if lines.is_empty() {
        "📭 No alert rules.".to_string()
    } else {
        format!("🔔 Alert rules:\n{}", lines.join("\n"))
    }
}

/// Parses `threshold <CODE> <gte|lte> <value> <name..>` or `trend <CODE> <trend> <name..>`.
fn parse_alert(spec: &[&str], active: bool) -> Result<NewAlert, String> {
    let (code, kind, name) = match spec {
        ["threshold", code, condition, value, name @ ..] if !name.is_empty() => {
            let condition = match *condition {
                "gte" | ">=" => ThresholdCondition::Greater,
                "lte" | "<=" => ThresholdCondition::Less,
                other => return Err(format!("❌ Unknown condition '{}', use gte or lte.", other)),
            };
            let Ok(value) = value.parse::<f64>() else {
                return Err(format!("❌ '{}' is not a rate value.", value));
            };
            (code, AlertKind::Threshold { condition, value }, name)
        }
        ["trend", code, trend, name @ ..] if !name.is_empty() => {
            let Ok(trend) = serde_json::from_value::<TrendAlert>(serde_json::Value::from(*trend)) else {
                return Err(format!("❌ Unknown trend '{}'.", trend));
            };
            (code, AlertKind::Trend { trend }, name)
        }
        _ => return Err("❌ Usage: threshold <CODE> <gte|lte> <value> <name> or trend <CODE> <trend> <name>".to_string()),
    };
    Ok(NewAlert {
        name: name.join(" "),
        currency_code: code.to_string(),
        kind,
        active,
    })
}

fn alert_type(kind: &AlertKind) -> &'static str {
    match kind {
        AlertKind::Threshold { .. } => "threshold",
        AlertKind::Trend { .. } => "trend",
    }
}

async fn add_alert(notifier: &ConsoleNotifier, alert: NewAlert) -> String {
    let alert_type = alert_type(&alert.kind);
    let created = notifier.storage.lock().await.alerts_mut().create(alert);
    match created {
        Ok(rule) => {
            let mut analytics = notifier.analytics.lock().await;
            if let Err(e) = analytics.track_alert_created(alert_type, &rule.currency_code).await {
                warn!("Analytics error: {}", e);
            }
            format!("✅ Created {}", describe_rule(&rule))
        }
        Err(e) => format!("❌ {}", e),
    }
}

/// Replaces a rule's definition; the rule keeps its on/off state.
async fn edit_alert(notifier: &ConsoleNotifier, id: u64, spec: &[&str]) -> String {
    let updated = {
        let mut storage = notifier.storage.lock().await;
        let alerts = storage.alerts_mut();
        let active = match alerts.get(id) {
            Ok(rule) => rule.active,
            Err(e) => return format!("❌ {}", e),
        };
        let alert = match parse_alert(spec, active) {
            Ok(alert) => alert,
            Err(reply) => return reply,
        };
        alerts.update(id, alert)
    };
    match updated {
        Ok(rule) => {
            let mut analytics = notifier.analytics.lock().await;
            if let Err(e) = analytics.track_alert_modified(rule.id, &rule.currency_code).await {
                warn!("Analytics error: {}", e);
            }
            format!("✏️ Updated {}", describe_rule(&rule))
        }
        Err(e) => format!("❌ {}", e),
    }
}

async fn convert_command(notifier: &ConsoleNotifier, mode: &str, code: &str, amount: &str) -> String {
    let mode = match mode.parse::<ConversionMode>() {
        Ok(m) => m,
        Err(_) => return format!("❌ Unknown mode '{}', use buy or sell.", mode),
    };
    let amount = match parse_amount(amount) {
        Ok(a) => a,
        Err(e) => return format!("❌ {}", e),
    };

    let conversion = {
        let storage = notifier.storage.lock().await;
        let Some(quote) = storage.get_quote(code) else {
            return format!("📭 No quote for {}.", code.to_uppercase());
        };
        convert(quote, mode, amount)
    };

    let code = code.to_uppercase();
    let local = notifier.config.local_currency.as_str();
    match conversion {
        Ok(conversion) => {
            let (from, to) = match mode {
                ConversionMode::Buy => (local, code.as_str()),
                ConversionMode::Sell => (code.as_str(), local),
            };
            let mut analytics = notifier.analytics.lock().await;
            if let Err(e) = analytics.track_conversion(from, to, amount).await {
                warn!("Analytics error: {}", e);
            }
            describe_conversion(&code, local, &conversion)
        }
        Err(e) => format!("❌ {}", e),
    }
}
