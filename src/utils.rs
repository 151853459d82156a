// Utility functions
use chrono::{DateTime, NaiveDate, Utc};

/// Parses an RFC 3339 timestamp into `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            // "2024-05-01 09:30:00" as served by some quote feeds
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Accepts a plain `YYYY-MM-DD` date or anything `parse_datetime` understands.
pub fn parse_day(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(trimmed).map(|dt| dt.date_naive()))
}

/// Epoch milliseconds to a UTC calendar day.
pub fn day_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_timestamped_days() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_day("2024-05-01"), Some(day));
        assert_eq!(parse_day("2024-05-01T22:10:00Z"), Some(day));
        assert_eq!(parse_day("2024-05-01 09:30:00"), Some(day));
        assert_eq!(parse_day("yesterday"), None);
    }

    #[test]
    fn millis_map_to_utc_day() {
        // 2024-05-01T00:00:00Z
        assert_eq!(day_from_millis(1_714_521_600_000), NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(1.005_1, 2), 1.01);
        assert_eq!(round_to(-2.345, 1), -2.3);
    }
}
