//! Append-only reconciliation ledger with full-tuple deduplication.
//!
//! The ledger is a CSV file with a fixed header. Rows are never rewritten.
//! Read-then-append is not atomic: callers must not run two writers on the
//! same file at once.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LedgerError, ReconError, Result};
use crate::models::summary::{ReconciliationSummary, LEDGER_HEADER};

/// Outcome of logging a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutcome {
    /// The row was appended.
    NewlyLogged,
    /// An identical row was already in the ledger; nothing was written.
    AlreadyPresent,
}

/// A ledger file on disk.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn err(&self, source: impl Into<LedgerError>) -> ReconError {
        ReconError::Ledger {
            path: self.path.clone(),
            source: source.into(),
        }
    }

    /// Create the file with its header row if it is missing or empty.
    pub fn initialize(&self) -> Result<()> {
        let empty = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(self.err(e)),
        };
        if !empty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.err(e))?;
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.err(e))?;
        writer.write_record(LEDGER_HEADER).map_err(|e| self.err(e))?;
        writer.flush().map_err(|e| self.err(e))?;
        debug!("Initialized ledger {}", self.path.display());
        Ok(())
    }

    /// All data rows, in file order. The header is checked and skipped.
    pub fn entries(&self) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.err(e))?;

        let mut rows = reader.records();
        match rows.next() {
            None => return Ok(Vec::new()),
            Some(header) => {
                let header = header.map_err(|e| self.err(e))?;
                if header.iter().ne(LEDGER_HEADER) {
                    return Err(self.err(LedgerError::HeaderMismatch {
                        found: header.iter().map(str::to_string).collect(),
                    }));
                }
            }
        }

        rows.map(|row| {
            row.map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| self.err(e))
        })
        .collect()
    }

    /// Append `summary` unless an identical row is already present.
    pub fn append_if_absent(&self, summary: &ReconciliationSummary) -> Result<LogOutcome> {
        self.initialize()?;

        let row = summary.ledger_row();
        let existing: HashSet<Vec<String>> = self.entries()?.into_iter().collect();
        if existing.contains(row.as_slice()) {
            info!("Period {} already logged in {}", summary.period, self.path.display());
            return Ok(LogOutcome::AlreadyPresent);
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.err(e))?;
        terminate_last_line(&mut file).map_err(|e| self.err(e))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&row).map_err(|e| self.err(e))?;
        writer.flush().map_err(|e| self.err(e))?;

        info!("Logged period {} to {}", summary.period, self.path.display());
        Ok(LogOutcome::NewlyLogged)
    }
}

/// Write a line terminator if the file does not already end with one.
fn terminate_last_line(file: &mut File) -> io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Log `summary` to the ledger at `ledger_path`.
pub fn log_summary(summary: &ReconciliationSummary, ledger_path: &Path) -> Result<LogOutcome> {
    Ledger::new(ledger_path).append_if_absent(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::Carrier;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn summary(period: &str) -> ReconciliationSummary {
        ReconciliationSummary {
            carrier: Carrier::Evri,
            period: period.to_string(),
            actual: Decimal::from_str("2.50").unwrap(),
            fixed: Decimal::from_str("2.44").unwrap(),
            difference: Decimal::from_str("0.06").unwrap(),
            total_units: 60,
            total_weight_kg: None,
        }
    }

    #[test]
    fn test_initialize_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("nested").join("evri_log.csv"));
        ledger.initialize().unwrap();
        ledger.initialize().unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "period,actual_cost,fixed_rate,difference,total_units\n");
        assert!(ledger.entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("evri_log.csv"));

        assert_eq!(ledger.append_if_absent(&summary("33")).unwrap(), LogOutcome::NewlyLogged);
        let len = fs::metadata(ledger.path()).unwrap().len();

        assert_eq!(ledger.append_if_absent(&summary("33")).unwrap(), LogOutcome::AlreadyPresent);
        assert_eq!(fs::metadata(ledger.path()).unwrap().len(), len);

        assert_eq!(
            ledger.entries().unwrap(),
            vec![vec!["33", "2.50", "2.44", "0.06", "60"]]
        );
    }

    #[test]
    fn test_different_period_appends_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evri_log.csv");
        fs::write(
            &path,
            "period,actual_cost,fixed_rate,difference,total_units\n33,2.50,2.44,0.06,60\n",
        )
        .unwrap();

        assert_eq!(log_summary(&summary("33"), &path).unwrap(), LogOutcome::AlreadyPresent);
        assert_eq!(log_summary(&summary("34"), &path).unwrap(), LogOutcome::NewlyLogged);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.ends_with("34,2.50,2.44,0.06,60\n"));
    }

    #[test]
    fn test_append_after_unterminated_last_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evri_log.csv");
        fs::write(
            &path,
            "period,actual_cost,fixed_rate,difference,total_units\n33,2.50,2.44,0.06,60",
        )
        .unwrap();

        assert_eq!(log_summary(&summary("33"), &path).unwrap(), LogOutcome::AlreadyPresent);
        assert_eq!(log_summary(&summary("34"), &path).unwrap(), LogOutcome::NewlyLogged);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "period,actual_cost,fixed_rate,difference,total_units\n33,2.50,2.44,0.06,60\n34,2.50,2.44,0.06,60\n"
        );
        assert_eq!(
            Ledger::new(&path).entries().unwrap(),
            vec![
                vec!["33", "2.50", "2.44", "0.06", "60"],
                vec!["34", "2.50", "2.44", "0.06", "60"],
            ]
        );
    }

    #[test]
    fn test_any_field_difference_is_a_new_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("evri_log.csv"));
        ledger.append_if_absent(&summary("33")).unwrap();

        let mut revised = summary("33");
        revised.total_units = 61;
        assert_eq!(ledger.append_if_absent(&revised).unwrap(), LogOutcome::NewlyLogged);
        assert_eq!(ledger.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_foreign_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evri_log.csv");
        fs::write(&path, "week,cost\n33,2.50\n").unwrap();

        let err = log_summary(&summary("33"), &path).unwrap_err();
        assert!(matches!(
            err,
            ReconError::Ledger { source: LedgerError::HeaderMismatch { .. }, .. }
        ));
    }
}
