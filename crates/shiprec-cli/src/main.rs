//! CLI application for carrier invoice reconciliation.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{batch, config, ledger, process};

/// Reconcile weekly Evri and FedEx invoices against the contracted per-unit
/// rate, flag expensive lines, and keep a ledger of reconciled weeks
#[derive(Parser)]
#[command(name = "shiprec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (-v info, -vv debug, -vvv trace incl. PDF crates)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a single invoice file
    Process(process::ProcessArgs),

    /// Reconcile every invoice matching a glob pattern
    Batch(batch::BatchArgs),

    /// Show a carrier's ledger
    Ledger(ledger::LedgerArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

    match cli.command {
        Commands::Process(args) => process::run(args, cli.config.as_deref()),
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()),
        Commands::Ledger(args) => ledger::run(args, cli.config.as_deref()),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises shiprec's own level while
/// dependencies stay at warn until `-vvv`.
fn log_filter(verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let deps = if verbose >= 3 { "trace" } else { "warn" };
    EnvFilter::new(format!("{deps},shiprec={level},shiprec_core={level}"))
}
