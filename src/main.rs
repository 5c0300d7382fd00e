//! Main entry point for the satchel CLI app

use clap::Parser;
use satchel::archive::{self, BuildOptions};
use satchel::cli::{self, Args};
use satchel::report::TraceReporter;
use satchel::{checksum, names};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (archive_name, checksum_name) = names::derive(&args.prefix);
    let password = cli::resolve_password(&args)?;

    let options = BuildOptions { level: args.level };
    let summary = archive::create(
        &args.paths,
        Path::new(&archive_name),
        password.as_deref(),
        &options,
        &TraceReporter,
    )?;

    let digest = checksum::write_file(Path::new(&archive_name), Path::new(&checksum_name))?;

    info!(
        archive = %archive_name,
        entries = summary.entries,
        skipped = summary.skipped,
        checksum = %digest,
        "backup created"
    );
    Ok(())
}
