// Local <-> foreign currency conversion at bank spot prices (quoted per 100 units)
use crate::model::{ConversionError, LatestQuote};
use crate::utils::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// Spend local currency on foreign currency, priced at the spot sell rate.
    Buy,
    /// Sell foreign currency for local currency, priced at the spot buy rate.
    Sell,
}

impl std::str::FromStr for ConversionMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(ConversionError::InvalidAmount(format!("unknown mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub mode: ConversionMode,
    pub amount: f64,
    pub result: f64,
    /// The quote price the result was computed with.
    pub rate_used: f64,
}

/// Accepts digits with an optional fractional part, nothing else.
pub fn parse_amount(text: &str) -> Result<f64, ConversionError> {
    let text = text.trim();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text, None),
    };
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() || !digits_only(int_part) || !frac_part.is_none_or(digits_only) {
        return Err(ConversionError::InvalidAmount(text.to_string()));
    }
    text.parse::<f64>()
        .map_err(|_| ConversionError::InvalidAmount(text.to_string()))
}

pub fn convert(
    quote: &LatestQuote,
    mode: ConversionMode,
    amount: f64,
) -> Result<Conversion, ConversionError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ConversionError::InvalidAmount(amount.to_string()));
    }

    let (label, price) = match mode {
        ConversionMode::Buy => ("spot sell", quote.spot_sell),
        ConversionMode::Sell => ("spot buy", quote.spot_buy),
    };
    let rate = price.ok_or_else(|| ConversionError::MissingPrice(label, quote.code.clone()))?;
    if rate == 0.0 {
        return Err(ConversionError::ZeroPrice(label, quote.code.clone()));
    }

    let raw = match mode {
        ConversionMode::Buy => amount / rate * 100.0,
        ConversionMode::Sell => amount * rate / 100.0,
    };

    Ok(Conversion {
        mode,
        amount,
        result: round_to(raw, 2),
        rate_used: rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> LatestQuote {
        LatestQuote {
            code: "USD".into(),
            name: "US Dollar".into(),
            spot_buy: Some(710.25),
            spot_sell: Some(713.26),
            ..LatestQuote::default()
        }
    }

    #[test]
    fn buying_uses_the_sell_price() {
        let c = convert(&usd(), ConversionMode::Buy, 1000.0).unwrap();
        assert_eq!(c.rate_used, 713.26);
        assert_eq!(c.result, 140.2);
    }

    #[test]
    fn selling_uses_the_buy_price() {
        let c = convert(&usd(), ConversionMode::Sell, 100.0).unwrap();
        assert_eq!(c.rate_used, 710.25);
        assert_eq!(c.result, 710.25);
    }

    #[test]
    fn missing_or_zero_price_is_an_error() {
        let mut quote = usd();
        quote.spot_sell = None;
        assert_eq!(
            convert(&quote, ConversionMode::Buy, 1.0),
            Err(ConversionError::MissingPrice("spot sell", "USD".into()))
        );
        quote.spot_buy = Some(0.0);
        assert_eq!(
            convert(&quote, ConversionMode::Sell, 1.0),
            Err(ConversionError::ZeroPrice("spot buy", "USD".into()))
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(convert(&usd(), ConversionMode::Sell, -5.0).is_err());
        assert!(convert(&usd(), ConversionMode::Sell, f64::INFINITY).is_err());
    }

    #[test]
    fn amount_text_must_be_plain_decimal() {
        assert_eq!(parse_amount("12"), Ok(12.0));
        assert_eq!(parse_amount("12.5"), Ok(12.5));
        assert_eq!(parse_amount("12."), Ok(12.0));
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("1e3").is_err());
        assert!(parse_amount(".5").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("BUY".parse::<ConversionMode>(), Ok(ConversionMode::Buy));
        assert!("swap".parse::<ConversionMode>().is_err());
    }
}
