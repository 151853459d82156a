use crate::config::CurrencyConfig;
use crate::model::LatestQuote;

pub fn normalize_all(quotes: &mut [LatestQuote], currencies: &[CurrencyConfig]) {
    for quote in quotes.iter_mut() {
        normalize_quote(quote, currencies);
    }
}

/// Matches a quote to a configured currency by code first, then by name keywords.
fn normalize_quote(quote: &mut LatestQuote, currencies: &[CurrencyConfig]) {
    if let Some(cfg) = currencies
        .iter()
        .find(|c| !quote.code.is_empty() && c.code.eq_ignore_ascii_case(&quote.code))
    {
        quote.code = cfg.code.to_uppercase();
        return;
    }

    let name = quote.name.to_lowercase();
    for currency in currencies {
        for keyword in &currency.match_keywords {
            if !keyword.is_empty() && name.contains(&keyword.to_lowercase()) {
                quote.code = currency.code.to_uppercase();
                return;
            }
        }
    }

    quote.code = "unknown".to_string();
}
