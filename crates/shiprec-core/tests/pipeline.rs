use std::fs;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use shiprec_core::{
    Carrier, Direction, LogOutcome, ParseError, Pipeline, ReconError, ShiprecConfig, TextDocument,
};

const EVRI_INVOICE: &str = "\
Evri Despatch WK33 Invoice 1 0.00 O 0.00
Despatch Packet 48 2.00 S 96.00
(0-1kg)
Despatch Parcel 12 4.50 S 54.00
(1kg - 2kg)
\x0c
Return Parcel 5 3.00 S 15.00
Fuel Surcharge 60 0.05 S 3.00
";

const FEDEX_INVOICE: &str = "\
123456789012 12/08/2024 International Priority 2 3.5 kg 5.00 1.00 6.00
Page 1 of 2
123456789013 13/08/2024 Cop Economy 1 1.2y kg 2.50 0.00 2.50
\x0c
Shipment total carried forward
123456789014 14/08/2024 Economy 3 4 kg REF-A 3.50 0.00 3.50
123456789015 14/08/2024 Economy 1 1 kg 0.00 0.00 0.00
";

fn config_in(dir: &std::path::Path) -> ShiprecConfig {
    ShiprecConfig {
        output_dir: dir.to_path_buf(),
        ..ShiprecConfig::default()
    }
}

#[test]
fn evri_document_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), Carrier::Evri);
    let result = pipeline.run(&TextDocument::new(EVRI_INVOICE)).unwrap();

    assert_eq!(result.summary.ledger_row(), ["33", "2.50", "2.44", "0.06", "60"].map(String::from));
    assert_eq!(result.summary.direction(), Direction::Over);
    assert_eq!(result.records.len(), 4);
    assert_eq!(result.anomalies.len(), 2);

    let report = result.report();
    assert!(report.contains("The actual cost is OVER the fixed rate."));
    assert!(report.contains("2 anomalous line(s) found."));
}

#[test]
fn fedex_document_cleans_and_discards() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), Carrier::Fedex);
    let result = pipeline.run(&TextDocument::new(FEDEX_INVOICE)).unwrap();

    // 12/08/2024 is a Monday in ISO week 33.
    assert_eq!(result.summary.period, "33");
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.dropped_zero, 1);
    assert_eq!(result.summary.total_units, 6);
    // (6.00 + 2.50 + 3.50) / 6 pieces
    assert_eq!(result.summary.actual, Decimal::new(200, 2));
    assert_eq!(result.summary.difference, Decimal::new(-110, 2));
    assert_eq!(result.summary.direction(), Direction::Under);
    assert_eq!(result.summary.total_weight_kg, Some(Decimal::new(87, 1)));

    let report = result.report();
    assert!(report.contains("Total weight:  8.7kg"));
    assert!(report.contains("Weight per piece:  1.45kg/piece"));

    // 6.00 over 2 pieces is the only line above 2.99
    let flagged: Vec<&str> = result.anomalies.iter().map(|r| r.record.reference()).collect();
    assert_eq!(flagged, vec!["123456789012"]);
}

#[test]
fn ledger_and_export_are_written_under_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), Carrier::Evri);
    let result = pipeline.run(&TextDocument::new(EVRI_INVOICE)).unwrap();

    assert_eq!(pipeline.log_summary(&result.summary).unwrap(), LogOutcome::NewlyLogged);
    assert_eq!(pipeline.log_summary(&result.summary).unwrap(), LogOutcome::AlreadyPresent);

    let ledger = fs::read_to_string(dir.path().join("evri_log.csv")).unwrap();
    assert_eq!(
        ledger,
        "period,actual_cost,fixed_rate,difference,total_units\n33,2.50,2.44,0.06,60\n"
    );

    let export = pipeline.export(&result.records).unwrap();
    assert_eq!(export, dir.path().join("evri").join("evri_week_33.csv"));
    assert_eq!(fs::read_to_string(export).unwrap().lines().count(), 5);
}

#[test]
fn leading_text_before_any_despatch_line_is_unreadable() {
    let pipeline = Pipeline::new(ShiprecConfig::default(), Carrier::Evri);
    let doc = TextDocument::new("Evri Limited\nDespatch Packet 1 2.00 S 2.00\n");
    assert!(matches!(
        pipeline.run(&doc),
        Err(ReconError::Parse(ParseError::UnreadableDocument { .. }))
    ));
}

#[test]
fn unknown_tax_code_aborts_the_document() {
    let pipeline = Pipeline::new(ShiprecConfig::default(), Carrier::Evri);
    let err = pipeline
        .run_lines(&["Despatch Packet WK33 10 2.00 Q 20.00"])
        .unwrap_err();
    assert_eq!(err.stage(), "derive");
}

#[test]
fn amounts_past_decimal_range_are_errors() {
    let pipeline = Pipeline::new(ShiprecConfig::default(), Carrier::Evri);
    let err = pipeline
        .run_lines(&["Despatch WK33 Packet 1 2.00 S 79,228,162,514,264,337,593,543,950,335.00"])
        .unwrap_err();
    assert!(matches!(
        err,
        ReconError::Parse(ParseError::InvalidField { ref field, .. }) if field == "gross_total"
    ));
}
