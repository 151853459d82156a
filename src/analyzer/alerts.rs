use crate::analyzer::market_indicators::{MarketAnalyzer, RunDirection};
use crate::model::{
    AlertError, AlertEvent, AlertKind, AlertRule, NewAlert, RateObservation, ThresholdCondition,
    TrendAlert,
};
use chrono::{Days, NaiveDate, Utc};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

const NEW_EXTREME_WINDOW_DAYS: u64 = 30;
const DAILY_MOVE_PERCENT: f64 = 1.0;
const RUN_DAYS: u32 = 3;
const HISTORY_CAPACITY: usize = 500;

/// In-memory alert rules plus the history of fired alerts.
#[derive(Debug, Default)]
pub struct AlertBook {
    rules: Vec<AlertRule>,
    history: VecDeque<AlertEvent>,
    /// Latest observation date each rule has fired for.
    last_fired: HashMap<u64, NaiveDate>,
    next_id: u64,
}

impl AlertBook {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn create(&mut self, alert: NewAlert) -> Result<AlertRule, AlertError> {
        validate(&alert)?;
        let rule = AlertRule {
            id: self.next_id,
            name: alert.name.trim().to_string(),
            currency_code: alert.currency_code.trim().to_uppercase(),
            kind: alert.kind,
            active: alert.active,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        info!("Alert #{} created: {} ({})", rule.id, rule.name, rule.currency_code);
        self.rules.push(rule.clone());
        Ok(rule)
    }

    pub fn get(&self, id: u64) -> Result<&AlertRule, AlertError> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .ok_or(AlertError::NotFound(id))
    }

    pub fn list(&self) -> &[AlertRule] {
        &self.rules
    }

    pub fn list_for<'a>(&'a self, currency_code: &'a str) -> impl Iterator<Item = &'a AlertRule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.currency_code.eq_ignore_ascii_case(currency_code))
    }

    /// Replaces a rule's definition, keeping its id and creation time.
    pub fn update(&mut self, id: u64, alert: NewAlert) -> Result<AlertRule, AlertError> {
        validate(&alert)?;
        let rule = self.get_mut(id)?;
        rule.name = alert.name.trim().to_string();
        rule.currency_code = alert.currency_code.trim().to_uppercase();
        rule.kind = alert.kind;
        rule.active = alert.active;
        info!("Alert #{} updated", id);
        Ok(rule.clone())
    }

    pub fn delete(&mut self, id: u64) -> Result<AlertRule, AlertError> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or(AlertError::NotFound(id))?;
        info!("Alert #{} deleted", id);
        self.last_fired.remove(&id);
        Ok(self.rules.remove(pos))
    }

    pub fn set_active(&mut self, id: u64, active: bool) -> Result<(), AlertError> {
        self.get_mut(id)?.active = active;
        info!("Alert #{} {}", id, if active { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Most recent events first.
    pub fn history(&self, limit: usize) -> Vec<&AlertEvent> {
        self.history.iter().rev().take(limit).collect()
    }

    /// Checks every active rule of a currency against the latest observation.
    /// A rule fires at most once per observation date, and never for a date
    /// older than one it already fired for.
    pub fn evaluate(&mut self, currency_code: &str, series: &[RateObservation]) -> Vec<AlertEvent> {
        let Some(latest) = series.last().copied() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        for rule in self.rules.iter().filter(|r| r.active) {
            if !rule.currency_code.eq_ignore_ascii_case(currency_code) {
                continue;
            }
            if self.last_fired.get(&rule.id).is_some_and(|d| *d >= latest.date) {
                debug!("Alert #{} already fired for {}", rule.id, latest.date);
                continue;
            }
            if !rule_matches(&rule.kind, series) {
                continue;
            }
            events.push(AlertEvent {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                currency_code: rule.currency_code.clone(),
                triggered_on: latest.date,
                rate: latest.value,
                kind: rule.kind,
            });
        }

        for event in &events {
            self.last_fired.insert(event.rule_id, event.triggered_on);
            if self.history.len() == HISTORY_CAPACITY {
                self.history.pop_front();
            }
            self.history.push_back(event.clone());
        }
        events
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut AlertRule, AlertError> {
        self.rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AlertError::NotFound(id))
    }
}

fn validate(alert: &NewAlert) -> Result<(), AlertError> {
    if alert.name.trim().is_empty() {
        return Err(AlertError::Invalid("name is required".into()));
    }
    if alert.currency_code.trim().is_empty() {
        return Err(AlertError::Invalid("currency code is required".into()));
    }
    if let AlertKind::Threshold { value, .. } = alert.kind {
        if !value.is_finite() || value < 0.0 {
            return Err(AlertError::Invalid(format!("threshold value {} out of range", value)));
        }
    }
    Ok(())
}

fn rule_matches(kind: &AlertKind, series: &[RateObservation]) -> bool {
    let Some(latest) = series.last() else {
        return false;
    };
    match *kind {
        AlertKind::Threshold { condition: ThresholdCondition::Greater, value } => latest.value >= value,
        AlertKind::Threshold { condition: ThresholdCondition::Less, value } => latest.value <= value,
        AlertKind::Trend { trend } => match trend {
            TrendAlert::NewHigh30d => is_new_extreme(series, |latest, other| latest > other),
            TrendAlert::NewLow30d => is_new_extreme(series, |latest, other| latest < other),
            TrendAlert::Rise1Percent => last_daily_change(series).is_some_and(|c| c > DAILY_MOVE_PERCENT),
            TrendAlert::Drop1Percent => last_daily_change(series).is_some_and(|c| c < -DAILY_MOVE_PERCENT),
            TrendAlert::Rise3Days => has_run(series, RunDirection::Up),
            TrendAlert::Drop3Days => has_run(series, RunDirection::Down),
        },
    }
}

/// Latest value beats every other observation in the trailing window.
fn is_new_extreme(series: &[RateObservation], beats: impl Fn(f64, f64) -> bool) -> bool {
    let Some((latest, earlier)) = series.split_last() else {
        return false;
    };
    let Some(window_start) = latest.date.checked_sub_days(Days::new(NEW_EXTREME_WINDOW_DAYS)) else {
        return false;
    };
    let mut window = earlier.iter().filter(|o| o.date >= window_start).peekable();
    window.peek().is_some() && window.all(|o| beats(latest.value, o.value))
}

/// Change into the latest observation; nothing when its predecessor is zero.
fn last_daily_change(series: &[RateObservation]) -> Option<f64> {
    let tail = series.get(series.len().checked_sub(2)?..)?;
    MarketAnalyzer::daily_changes(tail).pop()
}

fn has_run(series: &[RateObservation], direction: RunDirection) -> bool {
    let run = MarketAnalyzer::trailing_run(series);
    run.direction == Some(direction) && run.length >= RUN_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<RateObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| RateObservation::new(start + Days::new(i as u64), *v))
            .collect()
    }

    fn threshold(code: &str, condition: ThresholdCondition, value: f64) -> NewAlert {
        NewAlert {
            name: format!("{} {:?} {}", code, condition, value),
            currency_code: code.into(),
            kind: AlertKind::Threshold { condition, value },
            active: true,
        }
    }

    fn trend(code: &str, trend: TrendAlert) -> NewAlert {
        NewAlert {
            name: format!("{} {:?}", code, trend),
            currency_code: code.into(),
            kind: AlertKind::Trend { trend },
            active: true,
        }
    }

    #[test]
    fn crud_round_trip() {
        let mut book = AlertBook::new();
        let a = book.create(threshold("usd", ThresholdCondition::Greater, 720.0)).unwrap();
        let b = book.create(trend("EUR", TrendAlert::Rise3Days)).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.currency_code, "USD");
        assert_eq!(book.list().len(), 2);
        assert_eq!(book.list_for("usd").count(), 1);

        let updated = book.update(a.id, threshold("USD", ThresholdCondition::Less, 700.0)).unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.created_at, a.created_at);
        assert_eq!(
            book.get(a.id).unwrap().kind,
            AlertKind::Threshold { condition: ThresholdCondition::Less, value: 700.0 }
        );

        book.set_active(b.id, false).unwrap();
        assert!(!book.get(b.id).unwrap().active);

        book.delete(a.id).unwrap();
        assert_eq!(book.get(a.id), Err(AlertError::NotFound(a.id)));
        assert_eq!(book.delete(a.id), Err(AlertError::NotFound(a.id)));
        assert_eq!(book.set_active(99, true), Err(AlertError::NotFound(99)));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let mut book = AlertBook::new();
        let mut bad = threshold("USD", ThresholdCondition::Greater, -1.0);
        assert!(matches!(book.create(bad.clone()), Err(AlertError::Invalid(_))));
        bad.kind = AlertKind::Threshold { condition: ThresholdCondition::Greater, value: 1.0 };
        bad.name = "  ".into();
        assert!(matches!(book.create(bad), Err(AlertError::Invalid(_))));
        assert!(book.list().is_empty());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut book = AlertBook::new();
        book.create(threshold("USD", ThresholdCondition::Greater, 7.2)).unwrap();
        book.create(threshold("USD", ThresholdCondition::Less, 7.2)).unwrap();
        let events = book.evaluate("USD", &series(&[7.1, 7.2]));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].rate, 7.2);
    }

    #[test]
    fn fires_once_per_date_and_records_history() {
        let mut book = AlertBook::new();
        book.create(threshold("USD", ThresholdCondition::Greater, 7.0)).unwrap();
        let s = series(&[7.1, 7.3]);
        assert_eq!(book.evaluate("USD", &s).len(), 1);
        assert!(book.evaluate("USD", &s).is_empty());

        let next = series(&[7.1, 7.3, 7.4]);
        assert_eq!(book.evaluate("USD", &next).len(), 1);
        let history = book.history(10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].rate, 7.4);
    }

    #[test]
    fn inactive_and_foreign_rules_are_skipped() {
        let mut book = AlertBook::new();
        let rule = book.create(threshold("USD", ThresholdCondition::Greater, 0.0)).unwrap();
        book.create(threshold("JPY", ThresholdCondition::Greater, 0.0)).unwrap();
        book.set_active(rule.id, false).unwrap();
        assert!(book.evaluate("USD", &series(&[1.0])).is_empty());
        assert!(book.evaluate("USD", &[]).is_empty());
    }

    #[test]
    fn falling_rates_fire_the_mirrored_rules() {
        let mut book = AlertBook::new();
        let low = book.create(trend("EUR", TrendAlert::NewLow30d)).unwrap();
        book.create(trend("EUR", TrendAlert::NewHigh30d)).unwrap();
        book.create(trend("EUR", TrendAlert::Rise1Percent)).unwrap();
        let drop = book.create(trend("EUR", TrendAlert::Drop1Percent)).unwrap();
        book.create(trend("EUR", TrendAlert::Rise3Days)).unwrap();
        let slide = book.create(trend("EUR", TrendAlert::Drop3Days)).unwrap();

        let events = book.evaluate("EUR", &series(&[103.0, 102.5, 102.0, 100.0]));
        let ids: Vec<u64> = events.iter().map(|e| e.rule_id).collect();
        assert_eq!(ids, vec![low.id, drop.id, slide.id]);
        assert!(events.iter().all(|e| e.rate == 100.0));
    }

    #[test]
    fn older_dates_do_not_refire_and_history_is_capped() {
        let mut book = AlertBook::new();
        book.create(threshold("USD", ThresholdCondition::Greater, 0.0)).unwrap();
        assert_eq!(book.evaluate("USD", &series(&[1.0, 2.0, 3.0])).len(), 1);
        assert!(book.evaluate("USD", &series(&[1.0, 2.0])).is_empty());

        let start = NaiveDate::from_ymd_opt(2024, 6, 6).unwrap();
        for i in 0..HISTORY_CAPACITY as u64 + 5 {
            let s = [RateObservation::new(start + Days::new(i), 1.0)];
            assert_eq!(book.evaluate("USD", &s).len(), 1);
        }
        let history = book.history(usize::MAX);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].triggered_on, start + Days::new(HISTORY_CAPACITY as u64 + 4));
    }

    #[test]
    fn new_extremes_within_thirty_days() {
        let mut book = AlertBook::new();
        book.create(trend("GBP", TrendAlert::NewHigh30d)).unwrap();
        book.create(trend("GBP", TrendAlert::NewLow30d)).unwrap();

        let events = book.evaluate("GBP", &series(&[9.0, 9.1, 9.2]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Trend { trend: TrendAlert::NewHigh30d });

        // an equal earlier value is not beaten
        assert!(book.evaluate("GBP", &series(&[9.2, 9.1, 9.0, 9.2])).is_empty());

        // a single point has nothing to compare against
        let mut fresh = AlertBook::new();
        fresh.create(trend("GBP", TrendAlert::NewHigh30d)).unwrap();
        assert!(fresh.evaluate("GBP", &series(&[9.0])).is_empty());
    }

    #[test]
    fn old_observations_fall_out_of_the_window() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let s = vec![
            RateObservation::new(start, 50.0),
            RateObservation::new(start + Days::new(40), 10.0),
            RateObservation::new(start + Days::new(45), 12.0),
        ];
        assert!(is_new_extreme(&s, |latest, other| latest > other));
    }

    #[test]
    fn daily_move_and_run_rules() {
        let mut book = AlertBook::new();
        let rise = book.create(trend("EUR", TrendAlert::Rise1Percent)).unwrap();
        book.create(trend("EUR", TrendAlert::Drop1Percent)).unwrap();
        let run = book.create(trend("EUR", TrendAlert::Rise3Days)).unwrap();
        book.create(trend("EUR", TrendAlert::Drop3Days)).unwrap();

        let events = book.evaluate("EUR", &series(&[100.0, 100.5, 101.0, 103.0]));
        let ids: Vec<u64> = events.iter().map(|e| e.rule_id).collect();
        assert_eq!(ids, vec![rise.id, run.id]);

        let events = book.evaluate("EUR", &series(&[100.0, 100.5, 101.0, 103.0, 103.5]));
        let ids: Vec<u64> = events.iter().map(|e| e.rule_id).collect();
        assert_eq!(ids, vec![run.id]);
    }
}
