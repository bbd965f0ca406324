use engine_config::report::error::ReportError;
use engine_runtime::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// The env file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run failed: {0}")]
    Run(#[from] RunError),

    #[error("Failed to produce the run report: {0}")]
    Report(#[from] ReportError),

    #[error("Failed to write the run report: {0}")]
    ReportWrite(#[from] std::io::Error),
}
