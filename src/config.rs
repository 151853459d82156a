use crate::model::{AnalysisError, ConfigError, NewAlert};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    pub code: String,
    #[serde(default)]
    pub name: String,
    /// Trailing calendar days handed to the analyzer.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default)]
    pub match_keywords: Vec<String>,
}

/// Thresholds for trend signals.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub run_threshold_days: u32,
    pub distance_threshold_percent: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            run_threshold_days: 3,
            distance_threshold_percent: 3.0,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.run_threshold_days < 1 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "run_threshold_days must be at least 1, got {}",
                self.run_threshold_days
            )));
        }
        if self.distance_threshold_percent.is_nan() || self.distance_threshold_percent < 0.0 {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "distance_threshold_percent must be non-negative, got {}",
                self.distance_threshold_percent
            )));
        }
        Ok(())
    }
}

/// Which way a rising rate is colored on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeColoring {
    #[default]
    RiseIsFavorable,
    /// Local-currency view: a rising foreign rate shown as negative.
    RiseIsUnfavorable,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub batch_size: usize,
    pub flush_interval_seconds: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub currencies: Vec<CurrencyConfig>,
    #[serde(default = "default_local_currency")]
    pub local_currency: String,
    #[serde(default)]
    pub analysis: AnalysisOptions,
    #[serde(default)]
    pub change_coloring: ChangeColoring,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub alerts: Vec<NewAlert>,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

fn default_local_currency() -> String {
    "CNY".into()
}

fn default_window_days() -> u32 {
    30
}

fn default_check_interval() -> u64 {
    300
}

fn default_data_dir() -> String {
    "data".into()
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.analysis.validate()?;
    if config.analytics.batch_size == 0 {
        return Err(ConfigError::Invalid("analytics.batch_size must be positive".into()));
    }
    if config.check_interval_seconds == 0 {
        return Err(ConfigError::Invalid("check_interval_seconds must be positive".into()));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertKind, TrendAlert};

    #[test]
    fn minimal_config_takes_defaults() {
        let cfg = parse_config(r#"{ "currencies": [ { "code": "USD" } ] }"#).unwrap();
        assert_eq!(cfg.analysis, AnalysisOptions::default());
        assert_eq!(cfg.change_coloring, ChangeColoring::RiseIsFavorable);
        assert_eq!(cfg.currencies[0].window_days, 30);
        assert_eq!(cfg.check_interval_seconds, 300);
        assert_eq!(cfg.analytics.batch_size, 10);
        assert_eq!(cfg.local_currency, "CNY");
    }

    #[test]
    fn alerts_and_coloring_are_read() {
        let cfg = parse_config(
            r#"{
                "currencies": [ { "code": "JPY", "name": "Japanese Yen", "window_days": 7 } ],
                "change_coloring": "rise_is_unfavorable",
                "alerts": [
                    { "name": "yen low", "currency_code": "JPY", "type": "trend", "trend": "new_low_30d" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.change_coloring, ChangeColoring::RiseIsUnfavorable);
        assert_eq!(cfg.alerts.len(), 1);
        assert!(cfg.alerts[0].active);
        assert_eq!(cfg.alerts[0].kind, AlertKind::Trend { trend: TrendAlert::NewLow30d });
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let err = parse_config(
            r#"{ "currencies": [], "analysis": { "run_threshold_days": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Analysis(_)));

        let err = parse_config(
            r#"{ "currencies": [], "analysis": { "distance_threshold_percent": -1.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Analysis(_)));
    }
}
