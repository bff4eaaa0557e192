//! End-to-end reconciliation of one invoice document.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ReconError, Result};
use crate::export::export_records;
use crate::invoice::{derive_all, detect_carrier, grammar_for, normalize_all, parse_lines, Carrier, InvoiceGrammar};
use crate::ledger::{log_summary, LogOutcome};
use crate::models::config::ShiprecConfig;
use crate::models::record::DerivedRecord;
use crate::models::summary::ReconciliationSummary;
use crate::pdf::DocumentSource;
use crate::report::render_report;

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub carrier: Carrier,
    pub summary: ReconciliationSummary,
    /// Derived records in document order.
    pub records: Vec<DerivedRecord>,
    /// Records above the anomaly threshold, in document order.
    pub anomalies: Vec<DerivedRecord>,
    /// Zero-charge rows dropped during normalization.
    pub dropped_zero: usize,
    /// Rows excluded because a field failed to cast.
    pub excluded_invalid: usize,
}

impl PipelineResult {
    pub fn report(&self) -> String {
        let anomalies: Vec<&DerivedRecord> = self.anomalies.iter().collect();
        render_report(&self.summary, &anomalies)
    }
}

/// Runs a carrier grammar over documents using the configured terms.
pub struct Pipeline {
    config: ShiprecConfig,
    grammar: Box<dyn InvoiceGrammar>,
}

impl Pipeline {
    pub fn new(config: ShiprecConfig, carrier: Carrier) -> Self {
        let grammar = grammar_for(carrier, config.carrier(carrier).clone());
        Self { config, grammar }
    }

    /// Build a pipeline for `carrier`, or for the carrier named in the
    /// document text when none is given.
    pub fn for_document(
        config: ShiprecConfig,
        document: &dyn DocumentSource,
        carrier: Option<Carrier>,
    ) -> Result<Self> {
        let carrier = match carrier {
            Some(c) => c,
            None => {
                let text = document.full_text()?;
                let detected = detect_carrier(&text).ok_or(ReconError::UnknownCarrier)?;
                info!("Detected carrier: {}", detected);
                detected
            }
        };
        Ok(Self::new(config, carrier))
    }

    pub fn carrier(&self) -> Carrier {
        self.grammar.carrier()
    }

    pub fn config(&self) -> &ShiprecConfig {
        &self.config
    }

    pub fn grammar(&self) -> &dyn InvoiceGrammar {
        self.grammar.as_ref()
    }

    /// Text lines of every page, each cropped to the carrier's region.
    pub fn lines(&self, document: &dyn DocumentSource) -> Result<Vec<String>> {
        let terms = self.config.carrier(self.carrier());
        let mut lines = Vec::new();
        for page in 1..=document.page_count() {
            let page_lines = document.lines_in_region(page, terms.region_for_page(page))?;
            debug!("Page {}: {} lines", page, page_lines.len());
            lines.extend(page_lines);
        }
        Ok(lines)
    }

    /// Parse, normalize and derive a document's records.
    pub fn parse(&self, document: &dyn DocumentSource) -> Result<Vec<DerivedRecord>> {
        self.parse_lines(&self.lines(document)?)
    }

    /// Parse, normalize and derive already-extracted lines.
    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<DerivedRecord>> {
        Ok(self.derive_lines(lines)?.0)
    }

    fn derive_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<(Vec<DerivedRecord>, usize, usize)> {
        let grammar = self.grammar();
        let raw = parse_lines(grammar, lines)?;
        let set = normalize_all(grammar, &raw)?;
        let (dropped_zero, excluded_invalid) = (set.dropped_zero, set.excluded_invalid);
        let records = derive_all(grammar, set)?;
        Ok((records, dropped_zero, excluded_invalid))
    }

    pub fn reconcile(&self, records: &[DerivedRecord]) -> Result<ReconciliationSummary> {
        Ok(self.grammar.reconcile(records)?)
    }

    pub fn detect_anomalies<'a>(&self, records: &'a [DerivedRecord]) -> Vec<&'a DerivedRecord> {
        self.grammar.detect_anomalies(records)
    }

    /// Append the summary to this carrier's ledger unless already present.
    pub fn log_summary(&self, summary: &ReconciliationSummary) -> Result<LogOutcome> {
        log_summary(summary, &self.config.ledger_path(self.carrier()))
    }

    /// Write the records to this carrier's export directory.
    pub fn export(&self, records: &[DerivedRecord]) -> Result<PathBuf> {
        export_records(records, &self.config.export_dir(self.carrier()), self.carrier())
    }

    /// Parse, reconcile and flag anomalies. Nothing is written to disk.
    pub fn run(&self, document: &dyn DocumentSource) -> Result<PipelineResult> {
        self.run_lines(&self.lines(document)?)
    }

    pub fn run_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<PipelineResult> {
        let (records, dropped_zero, excluded_invalid) = self.derive_lines(lines)?;
        let summary = self.reconcile(&records)?;
        let anomalies = self
            .detect_anomalies(&records)
            .into_iter()
            .cloned()
            .collect();

        Ok(PipelineResult {
            carrier: self.carrier(),
            summary,
            records,
            anomalies,
            dropped_zero,
            excluded_invalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::models::summary::Direction;
    use crate::pdf::TextDocument;
    use rust_decimal::Decimal;

    const EVRI_LINES: &[&str] = &[
        "Evri Despatch WK33 Invoice 1 0.00 O 0.00",
        "Despatch Packet 48 2.00 S 96.00",
        "(0-1kg)",
        "Despatch Parcel 12 4.50 S 54.00",
        "Return Parcel 5 3.00 S 15.00",
        "Fuel Surcharge 60 0.05 S 3.00",
    ];

    #[test]
    fn test_run_lines() {
        let pipeline = Pipeline::new(ShiprecConfig::default(), Carrier::Evri);
        let result = pipeline.run_lines(EVRI_LINES).unwrap();

        assert_eq!(result.records.len(), 4);
        assert_eq!(result.dropped_zero, 1);
        assert_eq!(result.summary.period, "33");
        assert_eq!(result.summary.actual, Decimal::new(250, 2));
        assert_eq!(result.summary.total_units, 60);
        assert_eq!(result.summary.direction(), Direction::Over);

        let flagged: Vec<&str> = result.anomalies.iter().map(|r| r.record.reference()).collect();
        assert_eq!(flagged, vec!["Despatch Parcel", "Return Parcel"]);
    }

    #[test]
    fn test_for_document_detects_carrier() {
        let doc = TextDocument::new("FedEx Express UK Ltd\n");
        let pipeline = Pipeline::for_document(ShiprecConfig::default(), &doc, None).unwrap();
        assert_eq!(pipeline.carrier(), Carrier::Fedex);

        let unknown = TextDocument::new("Royal Mail\n");
        assert!(matches!(
            Pipeline::for_document(ShiprecConfig::default(), &unknown, None),
            Err(ReconError::UnknownCarrier)
        ));
    }

    #[test]
    fn test_unreadable_document() {
        let pipeline = Pipeline::new(ShiprecConfig::default(), Carrier::Evri);
        let err = pipeline.run_lines(&["Invoice number 42"]).unwrap_err();
        assert!(matches!(err, ReconError::Parse(ParseError::UnreadableDocument { .. })));
        assert_eq!(err.stage(), "parse");
    }
}
