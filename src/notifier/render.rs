// Human-readable text for analyzer output. All wording lives here.
use crate::analyzer::converter::{Conversion, ConversionMode};
use crate::model::{
    AlertEvent, AlertKind, AlertRule, CurrencyReport, LatestQuote, SignalDirection, SignalKind,
    ThresholdCondition, TrendAlert, TrendSignal,
};

pub fn describe_signal(signal: &TrendSignal, window_days: u32) -> String {
    match signal.kind {
        SignalKind::ConsecutiveRun => {
            let verb = if signal.direction == SignalDirection::Negative { "Fell" } else { "Rose" };
            format!("{} {} days in a row", verb, signal.magnitude as u32)
        }
        SignalKind::DistanceFromHigh => {
            format!("Down {:.2}% from the {}-day high", signal.magnitude, window_days)
        }
        SignalKind::DistanceFromLow => {
            format!("Up {:.2}% from the {}-day low", signal.magnitude, window_days)
        }
    }
}

fn direction_icon(direction: SignalDirection) -> &'static str {
    match direction {
        SignalDirection::Positive => "🟢",
        SignalDirection::Negative => "🔴",
        SignalDirection::Warning => "🟠",
    }
}

/// Arrow follows the sign of the change; the dot follows the coloring convention.
pub fn describe_change(change: Option<f64>, class: Option<SignalDirection>) -> String {
    match (change, class) {
        (Some(c), Some(class)) => {
            let arrow = if c > 0.0 { "▲" } else { "▼" };
            format!("{} {}{:.2}%", direction_icon(class), arrow, c.abs())
        }
        (Some(_), None) => "0.00%".to_string(),
        (None, _) => "-".to_string(),
    }
}

pub fn describe_report(report: &CurrencyReport) -> String {
    let title = if report.name.is_empty() {
        report.code.clone()
    } else {
        format!("{} ({})", report.name, report.code)
    };
    let mut msg = format!("📈 {} trend analysis\n", title);

    match report.latest {
        Some(latest) => msg.push_str(&format!(
            "💱 {:.4} on {} | {}\n",
            latest.value,
            latest.date,
            describe_change(report.change, report.change_class)
        )),
        None => msg.push_str("📭 No observations in the window.\n"),
    }

    if report.signals.is_empty() {
        msg.push_str("No notable trend features.\n");
    } else {
        for signal in &report.signals {
            msg.push_str(&format!(
                "{} {}\n",
                direction_icon(signal.direction),
                describe_signal(signal, report.window_days)
            ));
        }
    }

    if let Some(ext) = report.extremes {
        msg.push_str(&format!(
            "🔺 Recent high: {:.4} ({}) | 🔻 Recent low: {:.4} ({})",
            ext.high.value, ext.high.date, ext.low.value, ext.low.date
        ));
    }
    msg
}

pub fn describe_trend_alert(trend: TrendAlert) -> &'static str {
    match trend {
        TrendAlert::NewLow30d => "new 30-day low",
        TrendAlert::NewHigh30d => "new 30-day high",
        TrendAlert::Drop1Percent => "single-day drop over 1%",
        TrendAlert::Rise1Percent => "single-day rise over 1%",
        TrendAlert::Drop3Days => "fell 3 days in a row",
        TrendAlert::Rise3Days => "rose 3 days in a row",
    }
}

pub fn describe_alert_kind(kind: &AlertKind) -> String {
    match kind {
        AlertKind::Threshold { condition: ThresholdCondition::Greater, value } => format!("rate ≥ {:.4}", value),
        AlertKind::Threshold { condition: ThresholdCondition::Less, value } => format!("rate ≤ {:.4}", value),
        AlertKind::Trend { trend } => describe_trend_alert(*trend).to_string(),
    }
}

pub fn describe_rule(rule: &AlertRule) -> String {
    format!(
        "#{} {} [{}] {} ({})",
        rule.id,
        rule.name,
        rule.currency_code,
        describe_alert_kind(&rule.kind),
        if rule.active { "on" } else { "off" }
    )
}

pub fn describe_alert(event: &AlertEvent) -> String {
    format!(
        "🔔 Alert \"{}\": {} {} at {:.4} on {}",
        event.rule_name,
        event.currency_code,
        describe_alert_kind(&event.kind),
        event.rate,
        event.triggered_on
    )
}

pub fn describe_quote(quote: &LatestQuote, class: Option<SignalDirection>) -> String {
    let price = |p: Option<f64>| p.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
    format!(
        "{} {} | spot buy {} | cash buy {} | spot sell {} | cash sell {} | {}",
        quote.code,
        quote.name,
        price(quote.spot_buy),
        price(quote.cash_buy),
        price(quote.spot_sell),
        price(quote.cash_sell),
        describe_change(quote.change, class)
    )
}

pub fn describe_conversion(code: &str, local: &str, conversion: &Conversion) -> String {
    match conversion.mode {
        ConversionMode::Buy => format!(
            "💰 {:.2} {} buys {:.2} {} (spot sell {})",
            conversion.amount, local, conversion.result, code, conversion.rate_used
        ),
        ConversionMode::Sell => format!(
            "💰 {:.2} {} sells for {:.2} {} (spot buy {})",
            conversion.amount, code, conversion.result, local, conversion.rate_used
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RateObservation, SeriesExtremes};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn signal_wording() {
        let run = TrendSignal {
            kind: SignalKind::ConsecutiveRun,
            direction: SignalDirection::Negative,
            magnitude: 4.0,
        };
        assert_eq!(describe_signal(&run, 30), "Fell 4 days in a row");
        let high = TrendSignal {
            kind: SignalKind::DistanceFromHigh,
            direction: SignalDirection::Warning,
            magnitude: 6.0,
        };
        assert_eq!(describe_signal(&high, 30), "Down 6.00% from the 30-day high");
        let low = TrendSignal {
            kind: SignalKind::DistanceFromLow,
            direction: SignalDirection::Positive,
            magnitude: 4.123,
        };
        assert_eq!(describe_signal(&low, 7), "Up 4.12% from the 7-day low");
    }

    #[test]
    fn change_wording_keeps_arrow_with_sign() {
        assert_eq!(describe_change(Some(0.4), Some(SignalDirection::Negative)), "🔴 ▲0.40%");
        assert_eq!(describe_change(Some(-1.25), Some(SignalDirection::Positive)), "🟢 ▼1.25%");
        assert_eq!(describe_change(None, None), "-");
    }

    #[test]
    fn report_lists_key_nodes() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let obs = RateObservation::new(day, 7.1);
        let report = CurrencyReport {
            code: "USD".into(),
            name: "US Dollar".into(),
            window_days: 30,
            latest: Some(obs),
            change: None,
            change_class: None,
            extremes: Some(SeriesExtremes { high: obs, low: obs }),
            signals: vec![],
            generated_at: Utc::now(),
        };
        let text = describe_report(&report);
        assert!(text.starts_with("📈 US Dollar (USD) trend analysis"));
        assert!(text.contains("No notable trend features."));
        assert!(text.contains("Recent high: 7.1000 (2024-05-01)"));
    }
}
