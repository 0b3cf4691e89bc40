//! CLI argument parsing for the pricing engine.

use clap::Parser;
use std::path::PathBuf;

/// Replacement-cost pricing engine for insurance inventory claims
#[derive(Parser, Debug)]
#[command(name = "pricing-engine")]
#[command(about = "Prices an inventory list for insurance replacement-cost claims")]
#[command(version)]
pub struct Cli {
    /// Newline-delimited JSON input file. Reads stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Newline-delimited JSON output file. Writes stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optional TOML configuration file, layered under environment variables.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Job identifier stamped into logs; generated when omitted.
    #[arg(long)]
    pub job_id: Option<String>,
}
