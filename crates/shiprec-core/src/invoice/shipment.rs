//! Shipment-style grammar: one line per shipment with weight and split charges.

use std::borrow::Cow;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ParseError;
use crate::models::config::CarrierConfig;
use crate::models::record::{Category, DerivedRecord, InvoiceRecord, RawRecord, ShipmentLine};

use super::rules::patterns::{DIGIT_Y_ARTIFACT, SHIPMENT_LINE};
use super::rules::{calculate_gross, calculate_tax, parse_amount, parse_count, parse_weight, week_from_date, TaxCode};
use super::{per_unit, Carrier, ContinuationPolicy, InvoiceGrammar, Result};

/// Literal fragments inserted by the font extraction, removed from every line.
const STRIPPED_FRAGMENTS: &[&str] = &["Cop"];

/// Grammar for FedEx shipment invoices.
pub struct ShipmentGrammar {
    terms: CarrierConfig,
}

impl ShipmentGrammar {
    pub fn new(terms: CarrierConfig) -> Self {
        Self { terms }
    }
}

impl Default for ShipmentGrammar {
    fn default() -> Self {
        Self::new(CarrierConfig::fedex())
    }
}

fn field<'a>(raw: &'a RawRecord, name: &str) -> Result<&'a str> {
    raw.get(name).ok_or_else(|| ParseError::InvalidField {
        field: name.to_string(),
        value: String::new(),
    })
}

impl InvoiceGrammar for ShipmentGrammar {
    fn carrier(&self) -> Carrier {
        Carrier::Fedex
    }

    fn pattern(&self) -> &Regex {
        &SHIPMENT_LINE
    }

    fn text_field(&self) -> &'static str {
        "service"
    }

    fn continuation(&self) -> ContinuationPolicy {
        ContinuationPolicy::Discard
    }

    fn terms(&self) -> &CarrierConfig {
        &self.terms
    }

    fn clean_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut cleaned = Cow::Borrowed(line);
        for fragment in STRIPPED_FRAGMENTS {
            if cleaned.contains(fragment) {
                cleaned = Cow::Owned(cleaned.replace(fragment, ""));
            }
        }
        if DIGIT_Y_ARTIFACT.is_match(&cleaned) {
            cleaned = Cow::Owned(DIGIT_Y_ARTIFACT.replace_all(&cleaned, "$1").into_owned());
        }
        cleaned
    }

    fn normalize(&self, raw: &RawRecord) -> Result<InvoiceRecord> {
        let date = field(raw, "ship_date")?;
        let ship_date = NaiveDate::parse_from_str(date, "%d/%m/%Y").map_err(|_| ParseError::InvalidField {
            field: "ship_date".to_string(),
            value: date.to_string(),
        })?;

        Ok(InvoiceRecord::Shipment(ShipmentLine {
            shipment: field(raw, "shipment")?.to_string(),
            ship_date,
            service: field(raw, "service")?.trim().to_string(),
            pieces: parse_count("pieces", field(raw, "pieces")?)?,
            weight_kg: parse_weight("weight_kg", field(raw, "weight_kg")?)?,
            reference: raw.get("reference").map(str::to_string),
            taxable: parse_amount("taxable", field(raw, "taxable")?)?,
            non_taxable: parse_amount("non_taxable", field(raw, "non_taxable")?)?,
            total: parse_amount("total", field(raw, "total")?)?,
        }))
    }

    fn period(&self, first: &InvoiceRecord) -> Result<String> {
        first
            .date()
            .map(week_from_date)
            .ok_or_else(|| ParseError::MissingPeriodToken {
                fragment: first.reference().to_string(),
            })
    }

    fn derive(&self, record: InvoiceRecord, period: &str) -> Result<DerivedRecord> {
        let InvoiceRecord::Shipment(line) = &record else {
            return Err(ParseError::InvalidField {
                field: "record".to_string(),
                value: format!("{:?}", record),
            });
        };

        let tax = calculate_tax(line.taxable, TaxCode::Standard);
        let gross_total = calculate_gross(line.total, tax, &line.shipment)?;
        let unit_cost = per_unit(line.total, u64::from(line.pieces), "cost per piece", &line.shipment)?;

        Ok(DerivedRecord {
            record,
            period: period.to_string(),
            tax,
            gross_total,
            unit_cost,
            category: Category::Despatch,
            size: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_clean_line_strips_artifacts() {
        let grammar = ShipmentGrammar::default();
        assert_eq!(
            grammar.clean_line("123456789012 01/08/2024 Cop International Priority 2y 3.5 kg"),
            "123456789012 01/08/2024  International Priority 2 3.5 kg"
        );
        assert!(matches!(grammar.clean_line("Economy"), Cow::Borrowed(_)));
        assert_eq!(grammar.clean_line("Priority 1"), "Priority 1");
    }

    #[test]
    fn test_cleaned_line_matches() {
        let grammar = ShipmentGrammar::default();
        let cleaned = grammar.clean_line("123456789012 01/08/2024 International Priority 2 3.5y kg 4.50 1.20 5.70y");
        assert!(grammar.parse_line(&cleaned).is_some());
    }

    #[test]
    fn test_normalize_and_derive() {
        let grammar = ShipmentGrammar::default();
        let raw = grammar
            .parse_line("123456789012 15/08/2024 International Priority 2 3.5 kg 4.50 1.20 5.70")
            .unwrap();
        let record = grammar.normalize(&raw).unwrap();
        assert_eq!(grammar.period(&record).unwrap(), "33");

        let InvoiceRecord::Shipment(line) = &record else {
            panic!("expected a shipment line");
        };
        assert_eq!(line.pieces, 2);
        assert_eq!(line.weight_kg, dec("3.5"));
        assert_eq!(line.ship_date, NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());

        let derived = grammar.derive(record, "33").unwrap();
        assert_eq!(derived.tax, dec("0.90"));
        assert_eq!(derived.gross_total, dec("6.60"));
        assert_eq!(derived.unit_cost, dec("2.85"));
        assert_eq!(derived.category, Category::Despatch);
        assert_eq!(derived.size, None);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let grammar = ShipmentGrammar::default();
        let raw = grammar
            .parse_line("123456789012 31/02/2024 Economy 1 1 kg 2.00 0.00 2.00")
            .unwrap();
        assert!(matches!(
            grammar.normalize(&raw),
            Err(ParseError::InvalidField { ref field, .. }) if field == "ship_date"
        ));
    }
}
