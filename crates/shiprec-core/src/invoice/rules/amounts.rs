//! Numeric normalization for invoice captures.
//!
//! Amounts use `.` as decimal separator and `,` as thousands separator.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::WEIGHT_SUFFIX;
use crate::error::ParseError;

/// Parse an amount such as "2,679.83". Negative values are rejected.
pub fn parse_amount(field: &str, value: &str) -> Result<Decimal, ParseError> {
    let cleaned = strip_thousands(value);
    match Decimal::from_str(&cleaned) {
        Ok(amount) if !amount.is_sign_negative() => Ok(amount),
        _ => Err(invalid(field, value)),
    }
}

/// Parse a count such as "1,234".
pub fn parse_count(field: &str, value: &str) -> Result<u32, ParseError> {
    strip_thousands(value)
        .parse::<u32>()
        .map_err(|_| invalid(field, value))
}

/// Parse a weight such as "3.5 kg".
pub fn parse_weight(field: &str, value: &str) -> Result<Decimal, ParseError> {
    let bare = WEIGHT_SUFFIX.replace(value.trim(), "");
    parse_amount(field, &bare)
}

fn strip_thousands(value: &str) -> String {
    value.trim().replace(',', "")
}

fn invalid(field: &str, value: &str) -> ParseError {
    ParseError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Round to two places, half to even.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Format with exactly two decimals ("2.50"). Negative zero prints as "0.00".
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = round_money(amount);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(2);
    rounded.to_string()
}

/// Format with an explicit sign ("+0.06", "-1.20").
pub fn format_signed(amount: Decimal) -> String {
    let formatted = format_money(amount);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!("+{}", formatted)
    }
}

/// Group an integer in thousands ("12,345").
pub fn group_thousands(value: u64) -> String {
    let digits: Vec<char> = value.to_string().chars().collect();
    let mut formatted = String::new();

    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    formatted
}
