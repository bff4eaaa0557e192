//! Per-period CSV export of derived records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{ReconError, Result};
use crate::invoice::rules::format_money;
use crate::invoice::Carrier;
use crate::models::record::{DerivedRecord, InvoiceRecord};

const DESPATCH_COLUMNS: [&str; 10] = [
    "description",
    "quantity",
    "unit_price",
    "tax_code",
    "net_cost",
    "vat",
    "total_cost",
    "category",
    "size",
    "week",
];

const SHIPMENT_COLUMNS: [&str; 13] = [
    "shipment",
    "ship_date",
    "service",
    "pieces",
    "weight_kg",
    "reference",
    "taxable",
    "non_taxable",
    "total",
    "vat",
    "gross_total",
    "cost_per_piece",
    "week",
];

/// File name for one period's export, e.g. `evri_week_33.csv`.
pub fn export_file_name(carrier: Carrier, period: &str) -> String {
    format!("{}_week_{}.csv", carrier.slug(), period)
}

fn header(carrier: Carrier) -> &'static [&'static str] {
    match carrier {
        Carrier::Evri => &DESPATCH_COLUMNS,
        Carrier::Fedex => &SHIPMENT_COLUMNS,
    }
}

/// Derived amounts keep their full precision, with at least two decimals.
fn amount(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() < 2 {
        format_money(value)
    } else {
        value.to_string()
    }
}

fn row(record: &DerivedRecord) -> Vec<String> {
    match &record.record {
        InvoiceRecord::Despatch(line) => vec![
            line.description.clone(),
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.tax_code.clone(),
            line.net_cost.to_string(),
            amount(record.tax),
            amount(record.gross_total),
            record.category.to_string(),
            record.size.map(|s| s.to_string()).unwrap_or_default(),
            record.period.clone(),
        ],
        InvoiceRecord::Shipment(line) => vec![
            line.shipment.clone(),
            line.ship_date.format("%d/%m/%Y").to_string(),
            line.service.clone(),
            line.pieces.to_string(),
            line.weight_kg.to_string(),
            line.reference.clone().unwrap_or_default(),
            line.taxable.to_string(),
            line.non_taxable.to_string(),
            line.total.to_string(),
            amount(record.tax),
            amount(record.gross_total),
            amount(record.unit_cost),
            record.period.clone(),
        ],
    }
}

/// Write `records` as CSV with the carrier's column layout.
pub fn write_records<W: io::Write>(writer: W, records: &[DerivedRecord], carrier: Carrier) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header(carrier))?;
    for record in records {
        wtr.write_record(row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `records` to `<dir>/<carrier>_week_<period>.csv`, replacing any
/// earlier export for the same period. Returns the written path.
pub fn export_records(records: &[DerivedRecord], dir: &Path, carrier: Carrier) -> Result<PathBuf> {
    let period = records.first().map(|r| r.period.as_str()).unwrap_or("unknown");
    let path = dir.join(export_file_name(carrier, period));

    fs::create_dir_all(dir)?;

    let file = fs::File::create(&path)?;
    write_records(file, records, carrier).map_err(|source| ReconError::Export {
        path: path.clone(),
        source,
    })?;

    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}
