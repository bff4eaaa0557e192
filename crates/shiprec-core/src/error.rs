//! Error types for the shiprec-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::invoice::Carrier;

/// Main error type for the shiprec library.
#[derive(Error, Debug)]
pub enum ReconError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Parsing, normalization or reconciliation error.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Ledger read/append error.
    #[error("ledger error at {}: {source}", path.display())]
    Ledger {
        path: PathBuf,
        #[source]
        source: LedgerError,
    },

    /// Record export error.
    #[error("export error at {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No carrier given and none recognized in the document text.
    #[error("could not detect the carrier from the document text")]
    UnknownCarrier,
}

impl ReconError {
    /// Short name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ReconError::Pdf(_) => "extraction",
            ReconError::Parse(e) => e.stage(),
            ReconError::Ledger { .. } => "ledger",
            ReconError::Export { .. } => "export",
            ReconError::Io(_) => "io",
            ReconError::Config(_) => "config",
            ReconError::UnknownCarrier => "detect",
        }
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised while turning lines into reconciled records.
///
/// Every variant carries the input fragment that triggered it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Zero records matched, or a continuation line arrived before any record.
    #[error("unreadable {carrier} invoice: {reason} (at {fragment:?})")]
    UnreadableDocument {
        carrier: Carrier,
        reason: String,
        fragment: String,
    },

    /// A tax or reference code outside the known rate table.
    #[error("unknown tax code {code:?} in {fragment:?}")]
    UnknownCategoricalCode { code: String, fragment: String },

    /// A captured value could not be cast to its field type.
    #[error("failed to parse {field}: {value:?}")]
    InvalidField { field: String, value: String },

    /// Division by a zero unit count.
    #[error("zero units when computing {what} (at {fragment:?})")]
    DegenerateAggregate { what: String, fragment: String },

    /// The period identifier is absent from the first record.
    #[error("no period token in {fragment:?}")]
    MissingPeriodToken { fragment: String },
}

impl ParseError {
    pub fn stage(&self) -> &'static str {
        match self {
            ParseError::UnreadableDocument { .. } => "parse",
            ParseError::InvalidField { .. } => "normalize",
            ParseError::UnknownCategoricalCode { .. } => "derive",
            ParseError::DegenerateAggregate { .. } | ParseError::MissingPeriodToken { .. } => {
                "reconcile"
            }
        }
    }
}

/// Errors related to the reconciliation ledger file.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger file could not be read or appended.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The first row of an existing ledger is not the expected header.
    #[error("unexpected header {found:?}")]
    HeaderMismatch { found: Vec<String> },
}

/// Result type for the shiprec library.
pub type Result<T> = std::result::Result<T, ReconError>;
