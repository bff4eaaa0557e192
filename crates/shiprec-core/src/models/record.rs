//! Invoice line item models, from raw captures to derived records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Captured fields of one matched line, before any casting.
///
/// Continuation lines are appended to the grammar's free-text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
    text_field: &'static str,
}

impl RawRecord {
    /// Create an empty record whose free-text field is `text_field`.
    pub fn new(text_field: &'static str) -> Self {
        Self {
            fields: BTreeMap::new(),
            text_field,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Captured value, `None` when the group did not participate in the match.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The free-text field (description or service).
    pub fn text(&self) -> &str {
        self.get(self.text_field).unwrap_or_default()
    }

    /// Append a continuation line to the free-text field, space-joined.
    pub fn append_text(&mut self, line: &str) {
        let text = self.fields.entry(self.text_field.to_string()).or_default();
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(line);
    }
}

/// One despatch-style line: description, quantity, unit price, tax code, net cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DespatchLine {
    /// Service description, shortened at the first parenthesis.
    pub description: String,

    /// Number of despatches charged on this line.
    pub quantity: u32,

    /// Price per despatch (net).
    pub unit_price: Decimal,

    /// Tax code as printed; empty when the column was blank.
    pub tax_code: String,

    /// Net cost of the line.
    pub net_cost: Decimal,
}

/// One shipment-style line from the per-shipment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    /// 12-digit shipment number.
    pub shipment: String,

    /// Date the shipment was sent.
    pub ship_date: NaiveDate,

    /// Service name (e.g. "International Priority").
    pub service: String,

    /// Number of pieces in the shipment.
    pub pieces: u32,

    /// Chargeable weight in kilograms.
    pub weight_kg: Decimal,

    /// Optional reference code printed between weight and charges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Charges subject to tax.
    pub taxable: Decimal,

    /// Charges outside the scope of tax.
    pub non_taxable: Decimal,

    /// Taxable plus non-taxable.
    pub total: Decimal,
}

/// A normalized invoice line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvoiceRecord {
    Despatch(DespatchLine),
    Shipment(ShipmentLine),
}

impl InvoiceRecord {
    /// Free-text field used for classification.
    pub fn text(&self) -> &str {
        match self {
            InvoiceRecord::Despatch(line) => &line.description,
            InvoiceRecord::Shipment(line) => &line.service,
        }
    }

    /// Pre-tax cost used for reconciliation.
    pub fn cost(&self) -> Decimal {
        match self {
            InvoiceRecord::Despatch(line) => line.net_cost,
            InvoiceRecord::Shipment(line) => line.total,
        }
    }

    /// Units charged (despatch quantity or shipment pieces).
    pub fn units(&self) -> u32 {
        match self {
            InvoiceRecord::Despatch(line) => line.quantity,
            InvoiceRecord::Shipment(line) => line.pieces,
        }
    }

    /// Identifier shown in anomaly listings.
    pub fn reference(&self) -> &str {
        match self {
            InvoiceRecord::Despatch(line) => &line.description,
            InvoiceRecord::Shipment(line) => &line.shipment,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            InvoiceRecord::Despatch(_) => None,
            InvoiceRecord::Shipment(line) => Some(line.ship_date),
        }
    }

    /// Chargeable weight, for layouts that print one.
    pub fn weight(&self) -> Option<Decimal> {
        match self {
            InvoiceRecord::Despatch(_) => None,
            InvoiceRecord::Shipment(line) => Some(line.weight_kg),
        }
    }
}

/// Charge category, assigned by keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Outbound despatch (the primary service).
    Despatch,
    /// Returned item.
    Return,
    /// Anything else: fuel, surcharges, adjustments.
    Surcharge,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Despatch => "Despatch",
            Category::Return => "Return",
            Category::Surcharge => "Surcharge",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size subclass of a despatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Packet,
    Parcel,
    Other,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Packet => "Packet",
            SizeClass::Parcel => "Parcel",
            SizeClass::Other => "Other",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized record with its computed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedRecord {
    /// The normalized line item.
    pub record: InvoiceRecord,

    /// Period identifier of the document the record came from.
    pub period: String,

    /// Tax payable on the line.
    pub tax: Decimal,

    /// Cost including tax.
    pub gross_total: Decimal,

    /// Cost per unit charged.
    pub unit_cost: Decimal,

    /// Charge category.
    pub category: Category,

    /// Size subclass, only for despatches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeClass>,
}

impl DerivedRecord {
    pub fn is_primary(&self) -> bool {
        self.category == Category::Despatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_text_space_joins() {
        let mut raw = RawRecord::new("description").with_field("description", "Despatch Packet");
        raw.append_text("(2kg - 5kg)");
        raw.append_text("WK33");
        assert_eq!(raw.text(), "Despatch Packet (2kg - 5kg) WK33");
    }

    #[test]
    fn test_append_text_to_missing_field() {
        let mut raw = RawRecord::new("service");
        raw.append_text("Priority");
        assert_eq!(raw.text(), "Priority");
        assert_eq!(raw.get("service"), Some("Priority"));
    }

    #[test]
    fn test_record_accessors() {
        let record = InvoiceRecord::Despatch(DespatchLine {
            description: "Return Parcel".to_string(),
            quantity: 3,
            unit_price: Decimal::new(250, 2),
            tax_code: "S".to_string(),
            net_cost: Decimal::new(750, 2),
        });
        assert_eq!(record.text(), "Return Parcel");
        assert_eq!(record.cost(), Decimal::new(750, 2));
        assert_eq!(record.units(), 3);
        assert_eq!(record.date(), None);
        assert_eq!(record.weight(), None);
    }
}
