//! Feedwatch CLI - command-line interface for reporting and tuning.
//!
//! Two halves, one binary: `report` asks the classifier about one day's
//! uploads and renders what it found, while `evaluate`, `history`, and
//! `compare` form the measurement loop that judges the classifier against
//! operator labels across ruleset versions.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
