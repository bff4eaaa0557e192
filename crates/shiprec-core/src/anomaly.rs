//! Per-record anomaly detection.

use rust_decimal::Decimal;

use crate::models::record::DerivedRecord;

/// Records whose per-unit cost is strictly above `threshold`, in input order.
pub fn detect_anomalies(records: &[DerivedRecord], threshold: Decimal) -> Vec<&DerivedRecord> {
    records.iter().filter(|r| r.unit_cost > threshold).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{Category, InvoiceRecord, ShipmentLine};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn shipment(id: &str, unit_cost: &str) -> DerivedRecord {
        let cost = Decimal::from_str(unit_cost).unwrap();
        DerivedRecord {
            record: InvoiceRecord::Shipment(ShipmentLine {
                shipment: id.to_string(),
                ship_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
                service: "Economy".to_string(),
                pieces: 1,
                weight_kg: Decimal::ONE,
                reference: None,
                taxable: cost,
                non_taxable: Decimal::ZERO,
                total: cost,
            }),
            period: "31".to_string(),
            tax: Decimal::ZERO,
            gross_total: cost,
            unit_cost: cost,
            category: Category::Despatch,
            size: None,
        }
    }

    fn ids(found: &[&DerivedRecord]) -> Vec<String> {
        found.iter().map(|r| r.record.reference().to_string()).collect()
    }

    #[test]
    fn test_strictly_above_threshold() {
        let records = vec![shipment("a", "2.99"), shipment("b", "3.00"), shipment("c", "1.50"), shipment("d", "7.25")];
        let found = detect_anomalies(&records, Decimal::from_str("2.99").unwrap());
        assert_eq!(ids(&found), vec!["b", "d"]);
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let records: Vec<DerivedRecord> = ["0.50", "2.10", "2.99", "3.40", "5.00", "9.99"]
            .iter()
            .enumerate()
            .map(|(i, cost)| shipment(&i.to_string(), cost))
            .collect();

        let mut previous = usize::MAX;
        for step in 0..=12 {
            let threshold = Decimal::new(step * 100, 2);
            let count = detect_anomalies(&records, threshold).len();
            assert!(count <= previous, "threshold {} grew the subset", threshold);
            previous = count;
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_anomalies(&[], Decimal::ZERO).is_empty());
    }
}
