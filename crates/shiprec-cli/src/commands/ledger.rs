//! Ledger command - show a carrier's logged weeks.

use clap::Args;
use console::style;

use shiprec_core::models::summary::LEDGER_HEADER;
use shiprec_core::{Carrier, Ledger};

use super::load_config;

/// Arguments for the ledger command.
#[derive(Args)]
pub struct LedgerArgs {
    /// Carrier whose ledger to show
    carrier: Carrier,

    /// Print the raw CSV instead of a table
    #[arg(long)]
    csv: bool,
}

pub fn run(args: LedgerArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ledger = Ledger::new(config.ledger_path(args.carrier));

    if !ledger.path().exists() {
        println!(
            "{} No ledger yet at {}",
            style("ℹ").blue(),
            ledger.path().display()
        );
        return Ok(());
    }

    let entries = ledger.entries()?;

    if args.csv {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        wtr.write_record(LEDGER_HEADER)?;
        for entry in &entries {
            wtr.write_record(entry)?;
        }
        wtr.flush()?;
        return Ok(());
    }

    println!("{}", style(format!("{} ledger", args.carrier)).bold());
    println!(
        "{:>6}  {:>11}  {:>10}  {:>10}  {:>11}",
        "week", "actual_cost", "fixed_rate", "difference", "total_units"
    );
    for entry in &entries {
        let cell = |i: usize| entry.get(i).map(String::as_str).unwrap_or("");
        println!(
            "{:>6}  {:>11}  {:>10}  {:>10}  {:>11}",
            cell(0),
            cell(1),
            cell(2),
            cell(3),
            cell(4)
        );
    }
    println!();
    println!("{} week(s) logged in {}", entries.len(), ledger.path().display());

    Ok(())
}
