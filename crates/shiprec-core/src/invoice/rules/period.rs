//! Period identifier extraction.

use chrono::{Datelike, NaiveDate};

use super::patterns::WEEK_TOKEN;
use crate::error::ParseError;

/// Week number from a `WK<n>` token, e.g. "WK33" -> "33".
pub fn week_from_text(text: &str) -> Result<String, ParseError> {
    WEEK_TOKEN
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map(|week| week.to_string())
        .ok_or_else(|| ParseError::MissingPeriodToken {
            fragment: text.to_string(),
        })
}

/// ISO week number of a date.
pub fn week_from_date(date: NaiveDate) -> String {
    date.iso_week().week().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_from_text() {
        assert_eq!(week_from_text("Evri Despatch WK33").unwrap(), "33");
        assert_eq!(week_from_text("WK07 summary").unwrap(), "7");
    }

    #[test]
    fn test_missing_week_token() {
        assert_eq!(
            week_from_text("Despatch Packet"),
            Err(ParseError::MissingPeriodToken {
                fragment: "Despatch Packet".to_string()
            })
        );
    }

    #[test]
    fn test_week_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        assert_eq!(week_from_date(date), "33");
    }
}
