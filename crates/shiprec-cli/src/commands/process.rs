//! Process command - reconcile a single invoice file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use shiprec_core::export::write_records;
use shiprec_core::{
    open_document, Carrier, LogOutcome, Pipeline, PipelineResult, ReconError, ShiprecConfig,
};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or extracted text with form feeds between pages)
    #[arg(required = true)]
    input: PathBuf,

    /// Carrier layout (detected from the document when omitted)
    #[arg(long)]
    carrier: Option<Carrier>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Override the configured output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Append the summary to the carrier ledger
    #[arg(long)]
    log: bool,

    /// Write the derived records to a per-week CSV
    #[arg(long)]
    export: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text report
    Text,
    /// JSON with records, summary and anomalies
    Json,
    /// Derived records as CSV
    Csv,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Reading invoice...");

    let result = process_file(&args.input, args.carrier, config);
    pb.finish_and_clear();
    let (pipeline, result) = result?;

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    // Ledger and export failures leave the printed report valid.
    if args.log {
        let ledger_path = pipeline.config().ledger_path(result.carrier);
        match pipeline.log_summary(&result.summary).map_err(|e| staged(&args.input, e))? {
            LogOutcome::NewlyLogged => eprintln!(
                "{} Logged week {} to {}",
                style("✓").green(),
                result.summary.period,
                ledger_path.display()
            ),
            LogOutcome::AlreadyPresent => eprintln!(
                "{} Week {} already logged in {}",
                style("ℹ").blue(),
                result.summary.period,
                ledger_path.display()
            ),
        }
    }

    if args.export {
        let path = pipeline.export(&result.records).map_err(|e| staged(&args.input, e))?;
        eprintln!("{} Records exported to {}", style("✓").green(), path.display());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Name the document and the failing stage ahead of the underlying error.
fn staged(path: &Path, error: ReconError) -> anyhow::Error {
    let stage = error.stage();
    anyhow::Error::new(error).context(format!("{}: {} stage failed", path.display(), stage))
}

/// Open a document and run it through the pipeline for its carrier.
pub fn process_file(
    path: &Path,
    carrier: Option<Carrier>,
    config: ShiprecConfig,
) -> anyhow::Result<(Pipeline, PipelineResult)> {
    let run = || -> shiprec_core::Result<(Pipeline, PipelineResult)> {
        let document = open_document(path)?;
        let pipeline = Pipeline::for_document(config, document.as_ref(), carrier)?;
        let result = pipeline.run(document.as_ref())?;
        Ok((pipeline, result))
    };
    run().map_err(|e| staged(path, e))
}

pub fn format_result(result: &PipelineResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(result.report()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)? + "\n"),
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            write_records(&mut buf, &result.records, result.carrier)?;
            Ok(String::from_utf8(buf)?)
        }
    }
}
