// Rate payload parsing: history series and latest bank quotes
use crate::model::{LatestQuote, ParserError, RateObservation, RateSeries};
use crate::utils::{day_from_millis, parse_datetime, parse_day};
use chrono::{Days, NaiveDate};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const SERIES_KEYS: [&str; 4] = ["data", "data_points", "rates", "history"];
const RATE_KEYS: [&str; 4] = ["rate", "value", "spot_buy", "exchange_rate"];

pub trait Parser {
    fn parse_history(&self, payload: &str, window_days: Option<u32>) -> Result<RateSeries, ParserError>;
    fn parse_latest(&self, payload: &str) -> Result<Vec<LatestQuote>, ParserError>;
}

/// Tolerant parser for the JSON shapes rate feeds hand out.
#[derive(Debug, Default, Clone, Copy)]
pub struct RatePayloadParser;

impl RatePayloadParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for RatePayloadParser {
    /// Returns observations ascending by date, one per day (last record wins),
    /// trimmed to the trailing `window_days` calendar days when given.
    fn parse_history(&self, payload: &str, window_days: Option<u32>) -> Result<RateSeries, ParserError> {
        let root: Value = serde_json::from_str(payload)?;
        let records = find_records(&root)
            .ok_or_else(|| ParserError::UnexpectedShape("no history array found".into()))?;

        let mut parsed: Vec<RateObservation> = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for record in records {
            match record.as_object().and_then(observation_from) {
                Some(obs) => parsed.push(obs),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Skipped {} history records without a usable date or rate", skipped);
        }

        // stable sort keeps feed order within a day, so the last record wins below
        parsed.sort_by_key(|o| o.date);
        let mut series: RateSeries = Vec::with_capacity(parsed.len());
        for obs in parsed {
            match series.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => series.push(obs),
            }
        }

        let latest_date = series.last().map(|o| o.date);
        if let (Some(days), Some(latest)) = (window_days.filter(|d| *d > 0), latest_date) {
            if let Some(cutoff) = latest.checked_sub_days(Days::new(u64::from(days))) {
                series.retain(|o| o.date > cutoff);
            }
        }

        debug!("Parsed {} observations", series.len());
        Ok(series)
    }

    fn parse_latest(&self, payload: &str) -> Result<Vec<LatestQuote>, ParserError> {
        let root: Value = serde_json::from_str(payload)?;
        match &root {
            Value::Array(items) => Ok(items
                .iter()
                .filter_map(Value::as_object)
                .map(quote_from)
                .collect()),
            Value::Object(obj) => match obj.get("rates") {
                Some(Value::Object(rates)) => Ok(rates
                    .iter()
                    .map(|(code, prices)| LatestQuote {
                        code: code.to_uppercase(),
                        spot_buy: prices.get("buy").and_then(number),
                        spot_sell: prices.get("sell").and_then(number),
                        ..LatestQuote::default()
                    })
                    .collect()),
                Some(Value::Array(items)) => Ok(items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(quote_from)
                    .collect()),
                _ => Err(ParserError::UnexpectedShape("expected a quote array or a rates map".into())),
            },
            _ => Err(ParserError::UnexpectedShape("expected a quote array or a rates map".into())),
        }
    }
}

/// The record array, either at the root or under one of the usual keys (one level deep).
fn find_records(root: &Value) -> Option<&Vec<Value>> {
    match root {
        Value::Array(items) => Some(items),
        Value::Object(obj) => SERIES_KEYS.iter().find_map(|key| match obj.get(*key)? {
            Value::Array(items) => Some(items),
            nested @ Value::Object(_) => find_records(nested),
            _ => None,
        }),
        _ => None,
    }
}

fn observation_from(record: &Map<String, Value>) -> Option<RateObservation> {
    let value = rate_of(record)?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(RateObservation::new(date_of(record)?, value))
}

fn rate_of(record: &Map<String, Value>) -> Option<f64> {
    if let Some(v) = RATE_KEYS.iter().find_map(|k| record.get(*k).filter(|v| !v.is_null())) {
        return number(v);
    }
    record
        .iter()
        .filter(|(key, _)| is_rate_candidate(key))
        .find_map(|(_, v)| number(v))
}

fn is_rate_candidate(key: &str) -> bool {
    !matches!(key, "id" | "date" | "timestamp")
        && !["_id", "_at", "time", "name", "code"].iter().any(|p| key.contains(p))
}

fn date_of(record: &Map<String, Value>) -> Option<NaiveDate> {
    if let Some(date) = record.get("date").and_then(Value::as_str) {
        return parse_day(date);
    }
    if let Some(ts) = record.get("timestamp") {
        return match ts {
            Value::Number(n) => n.as_i64().and_then(day_from_millis),
            Value::String(s) => parse_day(s),
            _ => None,
        };
    }
    ["created_at", "update_time"]
        .iter()
        .find_map(|k| record.get(*k).and_then(Value::as_str))
        .and_then(parse_day)
}

fn quote_from(record: &Map<String, Value>) -> LatestQuote {
    let text = |key: &str| record.get(key).and_then(Value::as_str).unwrap_or_default().trim().to_string();
    LatestQuote {
        code: text("code").to_uppercase(),
        name: text("name"),
        spot_buy: first_number(record, &["spot_buy"]),
        cash_buy: first_number(record, &["cash_buy"]),
        spot_sell: first_number(record, &["spot_sell"]),
        cash_sell: first_number(record, &["cash_sell"]),
        conversion: first_number(record, &["boc_conversion", "conversion"]),
        change: first_number(record, &["change"]),
        updated_at: ["update_time", "updated_at"]
            .iter()
            .find_map(|k| record.get(*k).and_then(Value::as_str))
            .and_then(parse_datetime),
    }
}

fn first_number(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| record.get(*k).and_then(number))
}

/// JSON numbers and numeric strings.
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
