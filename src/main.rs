//! SortCopy CLI - copy a directory tree into folders named by extension

use anyhow::Context;
use clap::Parser;
use sortcopy::config::{CliArgs, LogFormat, SortConfig};
use sortcopy::core::SortEngine;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    init_logging(&args);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins over -v/-q when set
fn init_logging(args: &CliArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = SortConfig::from_cli(&args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(config.concurrency)
        .build()
        .context("failed to start the async runtime")?;

    let engine = SortEngine::new(config);

    let report = match runtime.block_on(engine.execute()) {
        Ok(report) => report,
        Err(e) if e.is_precondition() => {
            // Nothing was touched; this is not a failed run
            error!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(format) = args.summary {
        report.print_summary(format)?;
    }

    Ok(())
}
