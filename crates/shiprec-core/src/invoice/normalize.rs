//! Record-set normalization and derivation.

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::record::{DerivedRecord, InvoiceRecord, RawRecord};

use super::{InvoiceGrammar, Result};

/// Typed records of one document, with metadata rows removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSet {
    /// Period identifier read from the first valid record.
    pub period: String,
    /// Records with a non-zero cost, in document order.
    pub records: Vec<InvoiceRecord>,
    /// Number of zero-charge rows dropped.
    pub dropped_zero: usize,
    /// Number of records excluded because a field failed to cast.
    pub excluded_invalid: usize,
}

/// Cast raw records, read the period, and drop zero-charge rows.
///
/// A record with an uncastable field is excluded with a warning. If nothing
/// valid remains the document is unreadable.
pub fn normalize_all<G: InvoiceGrammar + ?Sized>(grammar: &G, raw: &[RawRecord]) -> Result<NormalizedSet> {
    let mut valid = Vec::with_capacity(raw.len());
    let mut excluded_invalid = 0;

    for record in raw {
        match grammar.normalize(record) {
            Ok(normalized) => valid.push(normalized),
            Err(e @ ParseError::InvalidField { .. }) => {
                warn!("Excluding record {:?}: {}", record.text(), e);
                excluded_invalid += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let Some(first) = valid.first() else {
        return Err(ParseError::UnreadableDocument {
            carrier: grammar.carrier(),
            reason: "no record had valid fields".to_string(),
            fragment: raw.first().map(|r| r.text().to_string()).unwrap_or_default(),
        });
    };
    let period = grammar.period(first)?;

    let before = valid.len();
    let records: Vec<InvoiceRecord> = valid.into_iter().filter(|r| !r.cost().is_zero()).collect();
    let dropped_zero = before - records.len();

    debug!(
        "Normalized {} records for period {} ({} zero-charge, {} invalid)",
        records.len(),
        period,
        dropped_zero,
        excluded_invalid
    );

    Ok(NormalizedSet {
        period,
        records,
        dropped_zero,
        excluded_invalid,
    })
}

/// Derive every record of a normalized set. The first failure aborts.
pub fn derive_all<G: InvoiceGrammar + ?Sized>(grammar: &G, set: NormalizedSet) -> Result<Vec<DerivedRecord>> {
    let period = set.period;
    set.records
        .into_iter()
        .map(|record| grammar.derive(record, &period))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{parse_lines, DespatchGrammar};

    fn normalize(lines: &[&str]) -> Result<NormalizedSet> {
        let grammar = DespatchGrammar::default();
        let raw = parse_lines(&grammar, lines)?;
        normalize_all(&grammar, &raw)
    }

    #[test]
    fn test_zero_charge_rows_are_dropped() {
        let set = normalize(&[
            "Evri Despatch WK33 Invoice 1 0.00 O 0.00",
            "Despatch Packet 12 2.09 S 25.08",
            "Returns Credit 3 0.00 S 0.00",
        ])
        .unwrap();
        assert_eq!(set.period, "33");
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.dropped_zero, 2);
        assert!(set.records.iter().all(|r| !r.cost().is_zero()));
    }

    #[test]
    fn test_period_read_before_zero_rows_drop() {
        // The only row carrying the week token is a metadata row.
        let set = normalize(&["Summary WK12 1 0.00 O 0.00", "Despatch Parcel 2 3.00 S 6.00"]).unwrap();
        assert_eq!(set.period, "12");
    }

    #[test]
    fn test_invalid_records_are_excluded() {
        let set = normalize(&[
            "Despatch WK33 Packet 12 2.09 S 25.08",
            "Despatch Parcel 999,999,999,999 2.00 S 10.00",
        ])
        .unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.excluded_invalid, 1);
    }

    #[test]
    fn test_missing_period_token() {
        assert!(matches!(
            normalize(&["Despatch Packet 12 2.09 S 25.08"]),
            Err(ParseError::MissingPeriodToken { .. })
        ));
    }

    #[test]
    fn test_derive_all_stamps_period() {
        let grammar = DespatchGrammar::default();
        let raw = parse_lines(&grammar, &["Despatch WK33 Packet 12 2.09 S 25.08", "Return Parcel 1 3.00 S 3.00"]).unwrap();
        let set = normalize_all(&grammar, &raw).unwrap();
        let derived = derive_all(&grammar, set).unwrap();
        assert_eq!(derived.len(), 2);
        assert!(derived.iter().all(|d| d.period == "33"));
    }
}
