use crate::config::ChangeColoring;
use crate::model::{RateObservation, SeriesExtremes, SignalDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDirection {
    Up,
    Down,
}

/// The run ending at the last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingRun {
    pub direction: Option<RunDirection>,
    pub length: u32,
}

pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// Counts same-direction day-over-day moves ending at the last observation.
    /// An unchanged day clears the run entirely.
    pub fn trailing_run(series: &[RateObservation]) -> TrailingRun {
        let mut direction = None;
        let mut length = 0u32;

        for w in series.windows(2) {
            let (prev, curr) = (w[0].value, w[1].value);
            if curr > prev {
                if direction == Some(RunDirection::Up) {
                    length += 1;
                } else {
                    direction = Some(RunDirection::Up);
                    length = 1;
                }
            } else if curr < prev {
                if direction == Some(RunDirection::Down) {
                    length += 1;
                } else {
                    direction = Some(RunDirection::Down);
                    length = 1;
                }
            } else {
                direction = None;
                length = 0;
            }
        }

        TrailingRun { direction, length }
    }

    /// Window high and low. Ties keep the earliest observation.
    pub fn extremes(series: &[RateObservation]) -> Option<SeriesExtremes> {
        let first = *series.first()?;
        let (high, low) = series.iter().skip(1).fold((first, first), |(high, low), obs| {
            (
                if obs.value > high.value { *obs } else { high },
                if obs.value < low.value { *obs } else { low },
            )
        });
        Some(SeriesExtremes { high, low })
    }

    /// Percentage change from `previous` to `current`; `None` without a usable base.
    pub fn period_change(current: f64, previous: Option<f64>) -> Option<f64> {
        let previous = previous?;
        if previous == 0.0 {
            return None;
        }
        let change = (current - previous) / previous * 100.0;
        change.is_finite().then_some(change)
    }

    /// Day-over-day percentage changes. Steps from a zero rate are skipped.
    pub fn daily_changes(series: &[RateObservation]) -> Vec<f64> {
        series
            .windows(2)
            .filter_map(|w| Self::period_change(w[1].value, Some(w[0].value)))
            .collect()
    }

    /// Display class of a change under the configured sign convention.
    pub fn classify_change(change: Option<f64>, coloring: ChangeColoring) -> Option<SignalDirection> {
        let change = change.filter(|c| *c != 0.0 && c.is_finite())?;
        let rising = change > 0.0;
        let favorable = match coloring {
            ChangeColoring::RiseIsFavorable => rising,
            ChangeColoring::RiseIsUnfavorable => !rising,
        };
        Some(if favorable {
            SignalDirection::Positive
        } else {
            SignalDirection::Negative
        })
    }
}
