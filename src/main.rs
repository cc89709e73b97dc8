//! depup-engine - dependency update decision engine CLI
//!
//! Reads a request describing a project's dependencies and the releases
//! available for them, then reports how each dependency can be updated.

use clap::Parser;
use depup_engine::cli::CliArgs;
use depup_engine::engine::Engine;
use depup_engine::output::{create_formatter, OutputConfig};
use depup_engine::registry::RetryingRegistry;
use depup_engine::request::Request;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; RUST_LOG overrides the verbosity flags
fn init_tracing(verbose: bool) {
    let default = if verbose { "depup_engine=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = args.engine_config()?;
    let request = Request::load(&args.request)?;
    debug!(
        request = %args.request.display(),
        dependencies = request.dependencies.len(),
        "loaded request"
    );

    let registry = Arc::new(RetryingRegistry::new(request.registry()));
    let engine = Engine::new(&config, registry)?.with_unlock(args.unlock);
    info!(strategy = %engine.settings().strategy, unlock = %args.unlock, "evaluating");

    let reports = engine
        .evaluate_with_progress(request.dependencies, request.advisories, args.show_progress())
        .await?;

    let formatter = create_formatter(OutputConfig::from_cli(args.json, args.verbose, args.quiet));
    let mut stdout = io::stdout().lock();
    formatter.format(&reports, &mut stdout)?;
    stdout.flush()?;

    // undetermined dependencies should be retried later
    if reports.iter().any(|r| r.is_undetermined()) {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
