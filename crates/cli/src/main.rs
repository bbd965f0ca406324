use crate::{commands::Commands, env::EnvManager, error::CliError, output::SummaryKeeper};
use clap::{CommandFactory, Parser, error::ErrorKind};
use connectors::embedded::EmbeddedBackend;
use engine_config::report::{console::ConsoleReporter, summary::RunSummary};
use engine_runtime::execution::executor;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod exit;
mod output;

#[derive(Parser)]
#[command(
    name = "bulkctl",
    version,
    about = "Checkpointed bulk import, update and delete against a partitioned document store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the run report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli.command).await {
        Ok(summary) => ExitCode::from(exit::for_status(&summary.status)),
        Err(err) => {
            error!(error = %err, "Run failed");
            eprintln!("Error: {err}");
            ExitCode::from(exit::FAILURE)
        }
    }
}

async fn execute(command: Commands) -> Result<RunSummary, CliError> {
    let (operation, args) = command.into_parts();

    let mut env = EnvManager::new();
    if let Some(path) = &args.env_file {
        env.load_from_file(path)?;
    }

    // Invalid settings are usage errors: report them like clap does and exit
    // before anything touches the store.
    let settings = args
        .settings(operation, env.credential(args.master_key.clone()))
        .unwrap_or_else(|err| Cli::command().error(ErrorKind::ValueValidation, err).exit());
    info!("Run settings:\n{settings}");

    let backend = EmbeddedBackend::new();
    let mut reporter = SummaryKeeper::new(ConsoleReporter::stdout());
    let outcome = executor::run(&settings, &backend, &mut reporter).await;

    // Failed runs still report a summary; write it before surfacing the error.
    if let (Some(path), Some(summary)) = (&args.report, reporter.summary()) {
        match output::write_report(summary, path).await {
            Ok(()) => info!(path = %path.display(), "Run summary written"),
            Err(err) if outcome.is_ok() => return Err(err),
            Err(err) => warn!(error = %err, "Failed to write the run summary"),
        }
    }

    Ok(outcome?)
}
