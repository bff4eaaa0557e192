//! Aggregate cost reconciliation against the contracted rate.

use rust_decimal::Decimal;
use tracing::info;

use crate::error::ParseError;
use crate::invoice::rules::round_money;
use crate::invoice::{per_unit, Carrier};
use crate::models::record::DerivedRecord;
use crate::models::summary::ReconciliationSummary;

/// Reconcile one period's records against `fixed_rate`.
///
/// Only the primary category counts. Sum-based, so record order does not matter.
pub fn reconcile(
    carrier: Carrier,
    records: &[DerivedRecord],
    fixed_rate: Decimal,
) -> Result<ReconciliationSummary, ParseError> {
    let period = records
        .first()
        .map(|r| r.period.clone())
        .ok_or_else(|| ParseError::DegenerateAggregate {
            what: "actual cost per unit".to_string(),
            fragment: "empty record set".to_string(),
        })?;

    if fixed_rate.is_zero() {
        return Err(ParseError::DegenerateAggregate {
            what: "variance against fixed rate".to_string(),
            fragment: fixed_rate.to_string(),
        });
    }

    let overflow = |what: &str| ParseError::DegenerateAggregate {
        what: what.to_string(),
        fragment: format!("period {} totals out of range", period),
    };

    let mut total_cost = Decimal::ZERO;
    let mut total_units = 0u64;
    let mut total_weight: Option<Decimal> = None;
    for record in records.iter().filter(|r| r.is_primary()) {
        total_cost = total_cost
            .checked_add(record.record.cost())
            .ok_or_else(|| overflow("total cost"))?;
        total_units = total_units
            .checked_add(u64::from(record.record.units()))
            .ok_or_else(|| overflow("total units"))?;
        if let Some(weight) = record.record.weight() {
            let sum = total_weight.unwrap_or(Decimal::ZERO);
            total_weight = Some(sum.checked_add(weight).ok_or_else(|| overflow("total weight"))?);
        }
    }

    let actual = round_money(per_unit(total_cost, total_units, "actual cost per unit", &period)?);
    let difference = round_money(actual.checked_sub(fixed_rate).ok_or_else(|| overflow("difference"))?);

    info!(
        "{} period {}: actual {} vs fixed {} over {} units",
        carrier, period, actual, fixed_rate, total_units
    );

    Ok(ReconciliationSummary {
        carrier,
        period,
        actual,
        fixed: fixed_rate,
        difference,
        total_units,
        total_weight_kg: total_weight,
    })
}
