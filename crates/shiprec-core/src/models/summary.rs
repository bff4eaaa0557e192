//! Reconciliation summary model.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::rules::amounts::{format_money, round_money};
use crate::invoice::Carrier;

/// Header row of every ledger file, in tuple order.
pub const LEDGER_HEADER: [&str; 5] = ["period", "actual_cost", "fixed_rate", "difference", "total_units"];

/// Whether the actual cost is above the contracted rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Over,
    Under,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Over => f.write_str("OVER"),
            Direction::Under => f.write_str("UNDER"),
        }
    }
}

/// Actual versus contracted cost per unit for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Carrier the summary was computed for. Not part of the ledger tuple.
    pub carrier: Carrier,

    /// Period identifier (week number).
    pub period: String,

    /// Actual cost per unit, rounded to two places.
    pub actual: Decimal,

    /// Contracted fixed rate per unit.
    pub fixed: Decimal,

    /// `actual - fixed`, rounded to two places.
    pub difference: Decimal,

    /// Units across the primary category.
    pub total_units: u64,

    /// Chargeable weight across the primary category, when the layout has one.
    /// Not part of the ledger tuple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight_kg: Option<Decimal>,
}

impl ReconciliationSummary {
    /// A zero difference reports `UNDER`.
    pub fn direction(&self) -> Direction {
        if self.difference > Decimal::ZERO {
            Direction::Over
        } else {
            Direction::Under
        }
    }

    /// `100 * (actual / fixed - 1)`, unrounded. `None` when it is out of range.
    pub fn variance_percent(&self) -> Option<Decimal> {
        self.actual
            .checked_div(self.fixed)
            .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    }

    /// Average chargeable weight per unit.
    pub fn weight_per_unit(&self) -> Option<Decimal> {
        let weight = self.total_weight_kg?;
        weight.checked_div(Decimal::from(self.total_units))
    }

    /// The stringified tuple persisted in the ledger. Identity is defined on it.
    pub fn ledger_row(&self) -> [String; 5] {
        [
            self.period.clone(),
            format_money(self.actual),
            format_money(self.fixed),
            format_money(round_money(self.difference)),
            self.total_units.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn summary(actual: &str, fixed: &str, difference: &str) -> ReconciliationSummary {
        ReconciliationSummary {
            carrier: Carrier::Evri,
            period: "33".to_string(),
            actual: Decimal::from_str(actual).unwrap(),
            fixed: Decimal::from_str(fixed).unwrap(),
            difference: Decimal::from_str(difference).unwrap(),
            total_units: 60,
            total_weight_kg: None,
        }
    }

    #[test]
    fn test_ledger_row_is_two_place_strings() {
        let s = summary("2.5", "2.44", "0.06");
        assert_eq!(s.ledger_row(), ["33", "2.50", "2.44", "0.06", "60"].map(String::from));
    }

    #[test]
    fn test_zero_difference_is_under() {
        let s = summary("2.44", "2.44", "0.00");
        assert_eq!(s.direction(), Direction::Under);
        assert_eq!(s.direction().to_string(), "UNDER");
    }

    #[test]
    fn test_direction_over() {
        assert_eq!(summary("2.50", "2.44", "0.06").direction(), Direction::Over);
        assert_eq!(summary("2.40", "2.44", "-0.04").direction(), Direction::Under);
    }

    #[test]
    fn test_ledger_row_ignores_scale_and_weight() {
        let a = summary("2.5", "2.44", "0.06");
        let mut b = summary("2.50", "2.440", "0.060");
        b.total_weight_kg = Some(Decimal::from(90));
        assert_eq!(a.ledger_row(), b.ledger_row());
    }

    #[test]
    fn test_variance_percent() {
        let s = summary("2.50", "2.44", "0.06");
        assert_eq!(s.variance_percent().unwrap().round_dp(2), Decimal::from_str("2.46").unwrap());
        assert_eq!(summary("2.50", "0", "2.50").variance_percent(), None);
        assert_eq!(summary("79228162514264337593543950335", "0.01", "0").variance_percent(), None);
    }

    #[test]
    fn test_weight_per_unit() {
        let mut s = summary("2.50", "2.44", "0.06");
        assert_eq!(s.weight_per_unit(), None);
        s.total_weight_kg = Some(Decimal::from(90));
        assert_eq!(s.weight_per_unit(), Some(Decimal::new(15, 1)));
    }
}
