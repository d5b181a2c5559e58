//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data loading error
    #[error("Ingest error: {0}")]
    Ingest(#[from] feedwatch_ingest::IngestError),

    /// Evaluation error
    #[error("Evaluation error: {0}")]
    Eval(#[from] feedwatch_eval::EvalError),

    /// Tuning history error
    #[error("Tracker error: {0}")]
    Tracker(#[from] feedwatch_eval::TrackerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No API key available
    #[error("No API key. Set GOOGLE_API_KEY or add api_key to the config file.")]
    MissingApiKey,
}
