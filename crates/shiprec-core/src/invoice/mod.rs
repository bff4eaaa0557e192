//! Carrier grammars: line parsing, normalization and derivation.

mod despatch;
mod normalize;
mod parser;
pub mod rules;
mod shipment;

pub use despatch::DespatchGrammar;
pub use normalize::{derive_all, normalize_all, NormalizedSet};
pub use parser::{parse_lines, ParserState};
pub use shipment::ShipmentGrammar;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::models::config::CarrierConfig;
use crate::models::record::{DerivedRecord, InvoiceRecord, RawRecord};
use crate::models::summary::ReconciliationSummary;

/// Result type for grammar operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Carriers with a supported invoice layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    /// Weekly despatch summary invoices.
    Evri,
    /// Per-shipment listing invoices.
    Fedex,
}

impl Carrier {
    pub const ALL: [Carrier; 2] = [Carrier::Evri, Carrier::Fedex];

    /// Lowercase name used in file names and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Carrier::Evri => "evri",
            Carrier::Fedex => "fedex",
        }
    }

    /// Report heading.
    pub fn title(&self) -> &'static str {
        match self {
            Carrier::Evri => "Evri E-commerce Despatch",
            Carrier::Fedex => "FedEx Retail Despatch",
        }
    }

    /// What one unit of `total_units` is.
    pub fn unit_label(&self) -> &'static str {
        match self {
            Carrier::Evri => "despatch",
            Carrier::Fedex => "piece",
        }
    }

    pub fn units_label(&self) -> &'static str {
        match self {
            Carrier::Evri => "despatches",
            Carrier::Fedex => "pieces",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Carrier::Evri => f.write_str("Evri"),
            Carrier::Fedex => f.write_str("FedEx"),
        }
    }
}

impl FromStr for Carrier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "evri" => Ok(Carrier::Evri),
            "fedex" => Ok(Carrier::Fedex),
            other => Err(format!("unknown carrier: {} (expected evri or fedex)", other)),
        }
    }
}

/// What the parser does with a line that does not match the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationPolicy {
    /// Append it to the current record's free-text field. Fatal before the first record.
    Merge,
    /// Skip it as page furniture.
    Discard,
}

/// A carrier-specific invoice grammar.
///
/// Implementations supply the line pattern and the typed casts; parsing,
/// reconciliation and anomaly detection are shared.
pub trait InvoiceGrammar {
    fn carrier(&self) -> Carrier;

    /// Full-line pattern with named capture groups, anchored at both ends.
    fn pattern(&self) -> &Regex;

    /// Capture group holding the free text continuation lines extend.
    fn text_field(&self) -> &'static str;

    fn continuation(&self) -> ContinuationPolicy {
        ContinuationPolicy::Merge
    }

    /// Contract terms for this carrier.
    fn terms(&self) -> &CarrierConfig;

    /// Strip extraction artifacts before matching.
    fn clean_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(line)
    }

    /// Match one cleaned line. `None` means the line is a continuation.
    fn parse_line(&self, line: &str) -> Option<RawRecord> {
        let pattern = self.pattern();
        let caps = pattern.captures(line)?;

        let mut raw = RawRecord::new(self.text_field());
        for name in pattern.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                raw = raw.with_field(name, m.as_str());
            }
        }
        Some(raw)
    }

    /// Cast captures to a typed record.
    fn normalize(&self, raw: &RawRecord) -> Result<InvoiceRecord>;

    /// Period identifier, read from the first record of a document.
    fn period(&self, first: &InvoiceRecord) -> Result<String>;

    /// Compute tax, totals, per-unit cost and category.
    fn derive(&self, record: InvoiceRecord, period: &str) -> Result<DerivedRecord>;

    fn reconcile(&self, records: &[DerivedRecord]) -> Result<ReconciliationSummary> {
        crate::reconcile::reconcile(self.carrier(), records, self.terms().fixed_rate)
    }

    fn detect_anomalies<'a>(&self, records: &'a [DerivedRecord]) -> Vec<&'a DerivedRecord> {
        crate::anomaly::detect_anomalies(records, self.terms().anomaly_threshold)
    }
}

/// Build the grammar for a carrier.
pub fn grammar_for(carrier: Carrier, terms: CarrierConfig) -> Box<dyn InvoiceGrammar> {
    match carrier {
        Carrier::Evri => Box::new(DespatchGrammar::new(terms)),
        Carrier::Fedex => Box::new(ShipmentGrammar::new(terms)),
    }
}

/// Guess the carrier from document text.
pub fn detect_carrier(text: &str) -> Option<Carrier> {
    if text.contains("Evri Limited") {
        Some(Carrier::Evri)
    } else if text.contains("FedEx Express") {
        Some(Carrier::Fedex)
    } else {
        None
    }
}

/// Per-unit division that refuses a zero denominator.
pub(crate) fn per_unit(cost: Decimal, units: u64, what: &str, fragment: &str) -> Result<Decimal> {
    if units == 0 {
        return Err(ParseError::DegenerateAggregate {
            what: what.to_string(),
            fragment: fragment.to_string(),
        });
    }
    Ok(cost / Decimal::from(units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_from_str() {
        assert_eq!("evri".parse::<Carrier>().unwrap(), Carrier::Evri);
        assert_eq!("FedEx".parse::<Carrier>().unwrap(), Carrier::Fedex);
        assert!("dhl".parse::<Carrier>().is_err());
    }

    #[test]
    fn test_detect_carrier() {
        assert_eq!(detect_carrier("Invoice\nEvri Limited\nCapitol House"), Some(Carrier::Evri));
        assert_eq!(detect_carrier("FedEx Express UK Ltd"), Some(Carrier::Fedex));
        assert_eq!(detect_carrier("Royal Mail"), None);
    }

    #[test]
    fn test_per_unit_rejects_zero() {
        assert!(per_unit(Decimal::ONE, 0, "unit cost", "x").is_err());
        assert_eq!(per_unit(Decimal::from(10), 4, "unit cost", "x").unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn test_grammar_for() {
        let grammar = grammar_for(Carrier::Fedex, CarrierConfig::fedex());
        assert_eq!(grammar.carrier(), Carrier::Fedex);
        assert_eq!(grammar.continuation(), ContinuationPolicy::Discard);
        assert_eq!(grammar_for(Carrier::Evri, CarrierConfig::evri()).continuation(), ContinuationPolicy::Merge);
    }
}
