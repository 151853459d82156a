use crate::analyzer::AlertBook;
use crate::model::{CurrencyReport, LatestQuote};
use std::collections::BTreeMap;

/// Process-lifetime store for quotes, analysis reports and alert rules.
/// Nothing here outlives the process.
#[derive(Debug)]
pub struct MemoryStorage {
    quotes: BTreeMap<String, LatestQuote>,
    reports: BTreeMap<String, CurrencyReport>,
    alerts: AlertBook,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            quotes: BTreeMap::new(),
            reports: BTreeMap::new(),
            alerts: AlertBook::new(),
        }
    }

    /// Replaces the quote set. Quotes that did not map to a currency are dropped.
    pub fn save_quotes(&mut self, quotes: Vec<LatestQuote>) -> usize {
        self.quotes = quotes
            .into_iter()
            .filter(|q| !q.code.is_empty() && q.code != "unknown")
            .map(|q| (q.code.clone(), q))
            .collect();
        self.quotes.len()
    }

    pub fn get_quote(&self, code: &str) -> Option<&LatestQuote> {
        self.quotes.get(&code.to_uppercase())
    }

    pub fn all_quotes(&self) -> impl Iterator<Item = &LatestQuote> {
        self.quotes.values()
    }

    pub fn save_report(&mut self, report: CurrencyReport) {
        self.reports.insert(report.code.clone(), report);
    }

    pub fn get_report(&self, code: &str) -> Option<&CurrencyReport> {
        self.reports.get(&code.to_uppercase())
    }

    pub fn all_reports(&self) -> impl Iterator<Item = &CurrencyReport> {
        self.reports.values()
    }

    pub fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    pub fn alerts_mut(&mut self) -> &mut AlertBook {
        &mut self.alerts
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_keyed_by_code_and_replaced_wholesale() {
        let mut storage = MemoryStorage::new();
        let usd = LatestQuote { code: "USD".into(), spot_buy: Some(710.0), ..LatestQuote::default() };
        let stray = LatestQuote { code: "unknown".into(), ..LatestQuote::default() };
        assert_eq!(storage.save_quotes(vec![usd.clone(), stray]), 1);
        assert_eq!(storage.get_quote("usd"), Some(&usd));

        let eur = LatestQuote { code: "EUR".into(), ..LatestQuote::default() };
        storage.save_quotes(vec![eur]);
        assert!(storage.get_quote("USD").is_none());
        assert_eq!(storage.all_quotes().count(), 1);
    }
}
