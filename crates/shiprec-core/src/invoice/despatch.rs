//! Despatch-style grammar: weekly summary lines with a VAT code column.

use regex::Regex;

use crate::error::ParseError;
use crate::models::config::CarrierConfig;
use crate::models::record::{DerivedRecord, DespatchLine, InvoiceRecord, RawRecord};

use super::rules::patterns::{DESPATCH_LINE, PARENTHETICAL_TAIL};
use super::rules::{
    calculate_gross, calculate_tax, classify_charge, order_size, parse_amount, parse_count,
    week_from_text, TaxCode,
};
use super::{per_unit, Carrier, InvoiceGrammar, Result};

/// Grammar for Evri despatch invoices.
pub struct DespatchGrammar {
    terms: CarrierConfig,
}

impl DespatchGrammar {
    pub fn new(terms: CarrierConfig) -> Self {
        Self { terms }
    }
}

impl Default for DespatchGrammar {
    fn default() -> Self {
        Self::new(CarrierConfig::evri())
    }
}

fn required<'a>(raw: &'a RawRecord, field: &str) -> Result<&'a str> {
    raw.get(field).ok_or_else(|| ParseError::InvalidField {
        field: field.to_string(),
        value: String::new(),
    })
}

impl InvoiceGrammar for DespatchGrammar {
    fn carrier(&self) -> Carrier {
        Carrier::Evri
    }

    fn pattern(&self) -> &Regex {
        &DESPATCH_LINE
    }

    fn text_field(&self) -> &'static str {
        "description"
    }

    fn terms(&self) -> &CarrierConfig {
        &self.terms
    }

    fn normalize(&self, raw: &RawRecord) -> Result<InvoiceRecord> {
        let description = PARENTHETICAL_TAIL
            .replace(required(raw, "description")?, "")
            .trim()
            .to_string();

        Ok(InvoiceRecord::Despatch(DespatchLine {
            description,
            quantity: parse_count("quantity", required(raw, "quantity")?)?,
            unit_price: parse_amount("unit_price", required(raw, "unit_price")?)?,
            tax_code: raw.get("tax_code").unwrap_or_default().to_string(),
            net_cost: parse_amount("net_cost", required(raw, "net_cost")?)?,
        }))
    }

    fn period(&self, first: &InvoiceRecord) -> Result<String> {
        week_from_text(first.text())
    }

    fn derive(&self, record: InvoiceRecord, period: &str) -> Result<DerivedRecord> {
        let InvoiceRecord::Despatch(line) = &record else {
            return Err(ParseError::InvalidField {
                field: "record".to_string(),
                value: format!("{:?}", record),
            });
        };

        let code = TaxCode::from_code(&line.tax_code, &line.description)?;
        let tax = calculate_tax(line.net_cost, code);
        let gross_total = calculate_gross(line.net_cost, tax, &line.description)?;
        let unit_cost = per_unit(gross_total, u64::from(line.quantity), "cost per despatch", &line.description)?;
        let category = classify_charge(&line.description);
        let size = order_size(&line.description, category);

        Ok(DerivedRecord {
            record,
            period: period.to_string(),
            tax,
            gross_total,
            unit_cost,
            category,
            size,
        })
    }
}
