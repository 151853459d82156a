use crate::analyzer::market_indicators::{MarketAnalyzer, RunDirection};
use crate::config::AnalysisOptions;
use crate::model::{AnalysisError, RateObservation, SignalDirection, SignalKind, TrendSignal};
use crate::utils::round_to;

/// Distances are compared and reported at display precision.
const DISTANCE_DECIMALS: i32 = 2;

/// Trait defining the interface for a rate series analyzer.
pub trait Analyzer {
    /// Derives trend signals for one currency's series.
    /// Signals come out as: consecutive run, distance from high, distance from low.
    fn analyze(
        &self,
        series: &[RateObservation],
        options: &AnalysisOptions,
    ) -> Result<Vec<TrendSignal>, AnalysisError>;

    /// Percentage change between two comparable observations.
    fn period_change(&self, current: f64, previous: Option<f64>) -> Option<f64>;
}

/// Implementation of the rate series analyzer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AnalyzerImpl {
    fn analyze(
        &self,
        series: &[RateObservation],
        options: &AnalysisOptions,
    ) -> Result<Vec<TrendSignal>, AnalysisError> {
        options.validate()?;

        let mut signals = Vec::new();
        if series.len() < 2 {
            return Ok(signals);
        }

        let run = MarketAnalyzer::trailing_run(series);
        if let Some(direction) = run.direction {
            if run.length >= options.run_threshold_days {
                signals.push(TrendSignal {
                    kind: SignalKind::ConsecutiveRun,
                    direction: match direction {
                        RunDirection::Up => SignalDirection::Positive,
                        RunDirection::Down => SignalDirection::Negative,
                    },
                    magnitude: f64::from(run.length),
                });
            }
        }

        // The caller decides the window; extremes cover whatever was passed in.
        let Some(extremes) = MarketAnalyzer::extremes(series) else {
            return Ok(signals);
        };
        let current = series[series.len() - 1].value;

        if let Some(from_high) = distance_below(extremes.high.value, current) {
            if from_high > options.distance_threshold_percent {
                signals.push(TrendSignal {
                    kind: SignalKind::DistanceFromHigh,
                    direction: SignalDirection::Warning,
                    magnitude: from_high,
                });
            }
        }

        if let Some(from_low) = distance_above(extremes.low.value, current) {
            if from_low > options.distance_threshold_percent {
                signals.push(TrendSignal {
                    kind: SignalKind::DistanceFromLow,
                    direction: SignalDirection::Positive,
                    magnitude: from_low,
                });
            }
        }

        Ok(signals)
    }

    fn period_change(&self, current: f64, previous: Option<f64>) -> Option<f64> {
        MarketAnalyzer::period_change(current, previous)
    }
}

/// `(high - current) / high * 100`, skipped for a zero high.
fn distance_below(high: f64, current: f64) -> Option<f64> {
    if high == 0.0 {
        return None;
    }
    let pct = round_to((high - current) / high * 100.0, DISTANCE_DECIMALS);
    pct.is_finite().then_some(pct)
}

/// `(current - low) / low * 100`, skipped for a zero low.
fn distance_above(low: f64, current: f64) -> Option<f64> {
    if low == 0.0 {
        return None;
    }
    let pct = round_to((current - low) / low * 100.0, DISTANCE_DECIMALS);
    pct.is_finite().then_some(pct)
}
