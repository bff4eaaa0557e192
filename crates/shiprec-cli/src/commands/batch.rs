//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use shiprec_core::invoice::rules::format_money;
use shiprec_core::{Carrier, LogOutcome, PipelineResult};

use super::load_config;
use super::process::process_file;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files
    #[arg(required = true)]
    input: String,

    /// Carrier layout for every file (detected per file when omitted)
    #[arg(long)]
    carrier: Option<Carrier>,

    /// Override the configured output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Append each summary to its carrier ledger
    #[arg(long)]
    log: bool,

    /// Write each file's records to a per-week CSV
    #[arg(long)]
    export: bool,

    /// Also write batch_summary.csv to the output directory
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<PipelineResult>,
    logged: Option<LogOutcome>,
    error: Option<String>,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Sequential: ledger appends must not interleave.
    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let outcome = match process_file(&path, args.carrier, config.clone()) {
            Ok((pipeline, result)) => {
                // Log and export failures leave the computed result valid.
                let mut logged = None;
                let mut step_errors = Vec::new();
                if args.log {
                    match pipeline.log_summary(&result.summary) {
                        Ok(outcome) => logged = Some(outcome),
                        Err(e) => step_errors.push(format!("log failed: {}", e)),
                    }
                }
                if args.export {
                    if let Err(e) = pipeline.export(&result.records) {
                        step_errors.push(format!("export failed: {}", e));
                    }
                }
                FileOutcome {
                    path,
                    result: Some(result),
                    logged,
                    error: (!step_errors.is_empty()).then(|| step_errors.join("; ")),
                }
            }
            Err(e) => FileOutcome {
                path,
                result: None,
                logged: None,
                error: Some(format!("{:#}", e)),
            },
        };

        if let Some(error_msg) = &outcome.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Processing {} failed: {}", outcome.path.display(), error_msg);
            }
        }
        outcomes.push(outcome);

        pb.inc(1);
    }

    pb.finish_and_clear();

    let (successful, failed): (Vec<_>, Vec<_>) = outcomes.iter().partition(|o| o.result.is_some());

    for outcome in &successful {
        if let Some(result) = &outcome.result {
            let note = match (outcome.logged, &outcome.error) {
                (_, Some(_)) => "step failed",
                (Some(LogOutcome::NewlyLogged), None) => "logged",
                (Some(LogOutcome::AlreadyPresent), None) => "already logged",
                (None, None) => "",
            };
            println!(
                "{:<24} {:<6} week {:<3} {} £{} ({} anomalies) {}",
                file_name(&outcome.path),
                result.carrier.to_string(),
                result.summary.period,
                result.summary.direction(),
                format_money(result.summary.actual),
                result.anomalies.len(),
                note
            );
        }
    }

    if args.summary {
        fs::create_dir_all(&config.output_dir)?;
        let summary_path = config.output_dir.join("batch_summary.csv");
        write_summary(&summary_path, &outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    let errors: Vec<&FileOutcome> = outcomes.iter().filter(|o| o.error.is_some()).collect();
    if !errors.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for outcome in &errors {
            eprintln!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "carrier",
        "period",
        "actual_cost",
        "fixed_rate",
        "difference",
        "direction",
        "total_units",
        "anomalies",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = file_name(&outcome.path);

        if let Some(result) = &outcome.result {
            let [period, actual, fixed, difference, units] = result.summary.ledger_row();
            let status = if outcome.error.is_some() { "partial" } else { "success" };
            wtr.write_record([
                filename,
                status,
                result.carrier.slug(),
                &period,
                &actual,
                &fixed,
                &difference,
                &result.summary.direction().to_string(),
                &units,
                &result.anomalies.len().to_string(),
                outcome.error.as_deref().unwrap_or(""),
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                outcome.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
