//! Human-readable reconciliation report.

use std::fmt::Write;

use crate::invoice::rules::{format_money, format_signed, group_thousands};
use crate::models::record::DerivedRecord;
use crate::models::summary::ReconciliationSummary;

/// Render the summary and its anomalies as a plain text block.
pub fn render_report(summary: &ReconciliationSummary, anomalies: &[&DerivedRecord]) -> String {
    let unit = summary.carrier.unit_label();
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", summary.carrier.title());
    let _ = writeln!(out, "Week: {}", summary.period);
    let _ = writeln!(out);
    let _ = writeln!(out, "The actual cost is {} the fixed rate.", summary.direction());
    let _ = writeln!(out);
    let _ = writeln!(out, "Fixed rate:   £{} per {}", format_money(summary.fixed), unit);
    let _ = writeln!(out, "Actual cost:  £{} per {}", format_money(summary.actual), unit);
    let variance = summary
        .variance_percent()
        .map(|v| format!("{}%", format_signed(v)))
        .unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(out, "Difference:   £{} ({})", format_signed(summary.difference), variance);
    if let Some(weight) = summary.total_weight_kg {
        let _ = writeln!(out);
        let _ = writeln!(out, "Total weight:  {}kg", weight.normalize());
    }
    let _ = writeln!(out, "Total {}:  {}", summary.carrier.units_label(), group_thousands(summary.total_units));
    if let Some(per_unit) = summary.weight_per_unit() {
        let _ = writeln!(out, "Weight per {}:  {}kg/{}", unit, format_money(per_unit), unit);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{} anomalous line(s) found.", anomalies.len());

    if !anomalies.is_empty() {
        let width = anomalies
            .iter()
            .map(|r| r.record.reference().len())
            .max()
            .unwrap_or(0)
            .max("reference".len());

        let _ = writeln!(out);
        let _ = writeln!(out, "{:<width$}  {:<10}  {:>9}", "reference", "date", "unit cost");
        for record in anomalies {
            let date = record
                .record
                .date()
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<width$}  {:<10}  {:>9}",
                record.record.reference(),
                date,
                format_money(record.unit_cost)
            );
        }
    }

    out
}
