//! Core library for carrier invoice reconciliation.
//!
//! This crate provides:
//! - Document sources (PDF text extraction and plain text)
//! - Carrier grammars that parse invoice lines into typed records
//! - Reconciliation of actual per-unit cost against a contracted rate
//! - Anomaly detection on individual lines
//! - An idempotent CSV ledger and per-period CSV exports

pub mod anomaly;
pub mod error;
pub mod export;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use error::{LedgerError, ParseError, PdfError, ReconError, Result};
pub use invoice::{detect_carrier, grammar_for, Carrier, ContinuationPolicy, InvoiceGrammar};
pub use ledger::{log_summary, Ledger, LogOutcome};
pub use models::config::{CarrierConfig, ShiprecConfig};
pub use models::record::{Category, DerivedRecord, InvoiceRecord, RawRecord, SizeClass};
pub use models::summary::{Direction, ReconciliationSummary};
pub use pdf::{open_document, DocumentSource, PageRegion, PdfExtractor, TextDocument};
pub use pipeline::{Pipeline, PipelineResult};
pub use report::render_report;
