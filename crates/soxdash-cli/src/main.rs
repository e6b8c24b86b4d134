mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::metadata::TraceId;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("soxdash=info,soxdash_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let dashboard = commands::build_dashboard(&cli)?;

    let Some(result) = commands::run(&cli, &dashboard).await? else {
        return Ok(ExitCode::SUCCESS);
    };

    let (envelope, view) = result.into_envelope(TraceId::new());
    output::render(&envelope, cli.format, cli.pretty, view.as_ref())?;

    // Demo data means no live tier answered.
    if envelope.meta.advisory.is_some() {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}
