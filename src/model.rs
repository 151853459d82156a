// Core structs: RateObservation, TrendSignal, LatestQuote, alert records and error types
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One (date, value) sample of a rate, quoted per 100 units of the foreign currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub value: f64,
}

impl RateObservation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Observations ascending by date, one per day at most.
pub type RateSeries = Vec<RateObservation>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    ConsecutiveRun,
    DistanceFromHigh,
    DistanceFromLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDirection {
    Positive,
    Negative,
    Warning,
}

/// Raw analyzer output. Text and coloring belong to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSignal {
    pub kind: SignalKind,
    pub direction: SignalDirection,
    /// Run length in days, or a percentage distance. Never negative.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesExtremes {
    pub high: RateObservation,
    pub low: RateObservation,
}

/// Latest bank quote for one currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestQuote {
    pub code: String,
    pub name: String,
    pub spot_buy: Option<f64>,
    pub cash_buy: Option<f64>,
    pub spot_sell: Option<f64>,
    pub cash_sell: Option<f64>,
    pub conversion: Option<f64>,
    pub change: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub currency_code: String,
    pub window_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdCondition {
    /// Fires when the rate is at or above the value.
    Greater,
    /// Fires when the rate is at or below the value.
    Less,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendAlert {
    #[serde(rename = "new_low_30d")]
    NewLow30d,
    #[serde(rename = "new_high_30d")]
    NewHigh30d,
    #[serde(rename = "drop_1p")]
    Drop1Percent,
    #[serde(rename = "rise_1p")]
    Rise1Percent,
    #[serde(rename = "drop_3d")]
    Drop3Days,
    #[serde(rename = "rise_3d")]
    Rise3Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    Threshold { condition: ThresholdCondition, value: f64 },
    Trend { trend: TrendAlert },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRule {
    pub id: u64,
    pub name: String,
    pub currency_code: String,
    pub kind: AlertKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAlert {
    pub name: String,
    pub currency_code: String,
    #[serde(flatten)]
    pub kind: AlertKind,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub rule_id: u64,
    pub rule_name: String,
    pub currency_code: String,
    pub triggered_on: NaiveDate,
    pub rate: f64,
    pub kind: AlertKind,
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate data not found: {0}")]
    NotFound(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParserError {
    #[error("malformed payload: {0}")]
    Json(String),
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),
}

impl From<serde_json::Error> for ParserError {
    fn from(e: serde_json::Error) -> Self {
        ParserError::Json(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("no {0} price quoted for {1}")]
    MissingPrice(&'static str, String),
    #[error("zero {0} price quoted for {1}")]
    ZeroPrice(&'static str, String),
}

#[derive(Debug, Error, PartialEq)]
pub enum AlertError {
    #[error("alert {0} not found")]
    NotFound(u64),
    #[error("invalid alert: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalyticsError {
    #[error("analytics session not started")]
    NotStarted,
    #[error("analytics session already stopped")]
    Stopped,
    #[error("event sink failed: {0}")]
    Sink(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Everything one analysis pass found for a currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyReport {
    pub code: String,
    pub name: String,
    pub window_days: u32,
    pub latest: Option<RateObservation>,
    /// Percent change against the previous observation.
    pub change: Option<f64>,
    pub change_class: Option<SignalDirection>,
    pub extremes: Option<SeriesExtremes>,
    pub signals: Vec<TrendSignal>,
    pub generated_at: DateTime<Utc>,
}
