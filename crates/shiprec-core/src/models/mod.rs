//! Data models for records, summaries and configuration.

pub mod config;
pub mod record;
pub mod summary;
