//! Pricing Engine - replacement-cost pricing CLI
//!
//! Reads newline-delimited JSON `Row` records from a file or stdin, prices
//! each through the `pricing-core` pipeline, and writes newline-delimited
//! JSON `PricingResult` records to a file or stdout.

#![forbid(unsafe_code)]

use clap::Parser;
use pricing_core::Error as CoreError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod run;

/// Exit codes for the CLI host (spec §6.3). `1` covers anything the spec
/// doesn't name explicitly (I/O errors reading/writing the row files).
const EXIT_CONFIG_ERROR: i32 = 2;
const EXIT_NO_CREDENTIALS: i32 = 3;
const EXIT_CANCELLED: i32 = 4;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pricing_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    info!("Starting pricing engine v{}", env!("CARGO_PKG_VERSION"));

    if cli.config.is_none() && !std::path::Path::new(".env").exists() {
        warn!("no --config file and no .env found; relying on PRICING_ env vars only");
    }

    match run::run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "pricing run failed");
            std::process::ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Map a whole-job failure to the exit code spec §6.3 assigns it. Per-item
/// failures never reach here — the pipeline never returns one.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let code = err.chain().find_map(|cause| {
        cause.downcast_ref::<CoreError>().map(|core_err| match core_err {
            CoreError::Config(_) | CoreError::ConfigLoad(_) => EXIT_CONFIG_ERROR,
            CoreError::MissingCredentials(_) => EXIT_NO_CREDENTIALS,
            CoreError::Cancelled => EXIT_CANCELLED,
            CoreError::Llm(_) | CoreError::Search(_) | CoreError::Cache(_) => 1,
        })
    });
    code.unwrap_or(1) as u8
}
