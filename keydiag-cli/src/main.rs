//! keydiag - diagnostics report for hardware security keys
//!
//! Probes every reachable security key over PC/SC, HID OTP and HID
//! FIDO and prints one tab-indented text report. Device and service
//! failures never abort the run; they show up as report lines.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

#[derive(Parser)]
#[command(name = "keydiag")]
#[command(version)]
#[command(about = "Diagnostics report for hardware security keys")]
struct Cli {
    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout carries only the report.
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("keydiag={log_level},keydiag_transport={log_level}").into()
            }),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("collecting diagnostics");
    let report = keydiag::generate_diagnostics_report();

    match cli.output {
        Some(path) => {
            fs::write(&path, format!("{report}\n"))
                .with_context(|| format!("writing report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{report}"),
    }
    Ok(())
}
