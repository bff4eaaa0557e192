//! Configuration structures for the reconciliation pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::invoice::Carrier;
use crate::pdf::PageRegion;

/// Main configuration for the shiprec pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiprecConfig {
    /// Root directory for ledgers and exports.
    pub output_dir: PathBuf,

    /// Despatch-style invoices (Evri).
    pub evri: CarrierConfig,

    /// Shipment-style invoices (FedEx).
    pub fedex: CarrierConfig,
}

impl Default for ShiprecConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            evri: CarrierConfig::evri(),
            fedex: CarrierConfig::fedex(),
        }
    }
}

/// Per-carrier contract terms, outputs and page layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// Contracted cost per unit.
    pub fixed_rate: Decimal,

    /// Per-unit cost above which a line is anomalous.
    pub anomaly_threshold: Decimal,

    /// Ledger file name, relative to `output_dir`.
    pub ledger_file: String,

    /// Export directory name, relative to `output_dir`.
    pub export_dir: String,

    /// Crop region on the first page.
    pub first_page_region: PageRegion,

    /// Crop region on every later page.
    pub page_region: PageRegion,
}

impl CarrierConfig {
    pub fn evri() -> Self {
        let region = PageRegion::new(55.0, 306.0, 564.0, 489.0);
        Self {
            fixed_rate: Decimal::new(244, 2),
            anomaly_threshold: Decimal::new(299, 2),
            ledger_file: "evri_log.csv".to_string(),
            export_dir: "evri".to_string(),
            first_page_region: region,
            page_region: region,
        }
    }

    pub fn fedex() -> Self {
        Self {
            fixed_rate: Decimal::new(310, 2),
            anomaly_threshold: Decimal::new(299, 2),
            ledger_file: "fedex_log.csv".to_string(),
            export_dir: "fedex".to_string(),
            first_page_region: PageRegion::new(30.0, 297.0, 563.0, 785.0),
            page_region: PageRegion::new(30.0, 0.0, 563.0, 785.0),
        }
    }

    /// Region to crop on a 1-indexed page.
    pub fn region_for_page(&self, page: u32) -> PageRegion {
        if page <= 1 {
            self.first_page_region
        } else {
            self.page_region
        }
    }
}

impl ShiprecConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    pub fn carrier(&self, carrier: Carrier) -> &CarrierConfig {
        match carrier {
            Carrier::Evri => &self.evri,
            Carrier::Fedex => &self.fedex,
        }
    }

    /// Full path to a carrier's ledger file.
    pub fn ledger_path(&self, carrier: Carrier) -> PathBuf {
        self.output_dir.join(&self.carrier(carrier).ledger_file)
    }

    /// Full path to a carrier's export directory.
    pub fn export_dir(&self, carrier: Carrier) -> PathBuf {
        self.output_dir.join(&self.carrier(carrier).export_dir)
    }

    /// Check values that would make reconciliation meaningless.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for carrier in Carrier::ALL {
            let section = self.carrier(carrier);
            if section.fixed_rate <= Decimal::ZERO {
                issues.push(format!("{carrier}: fixed_rate must be positive"));
            }
            if section.anomaly_threshold < Decimal::ZERO {
                issues.push(format!("{carrier}: anomaly_threshold must not be negative"));
            }
            if section.ledger_file.trim().is_empty() {
                issues.push(format!("{carrier}: ledger_file is empty"));
            }
            if !section.first_page_region.is_valid() {
                issues.push(format!("{carrier}: first_page_region is not a valid box"));
            }
            if !section.page_region.is_valid() {
                issues.push(format!("{carrier}: page_region is not a valid box"));
            }
        }
        issues
    }
}
