//! Feedwatch CLI - main entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use feedwatch_cli::commands;
use feedwatch_cli::{Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    // Logs go to stderr so table and JSON output stay pipeable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> feedwatch_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load or create config
    let config = Config::load().unwrap_or_else(|_| {
        let cfg = Config::default();
        cfg.save().ok();
        cfg
    });

    // Determine data directory
    let data_dir = PathBuf::from(cli.data_dir.unwrap_or_else(|| config.data_dir.clone()));

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    match cli.command {
        Command::History => {
            commands::execute_history(&data_dir, &formatter).await?;
        }
        Command::Compare(args) => {
            commands::execute_compare(args, &data_dir, &formatter).await?;
        }
        cmd => {
            // Commands that call the classifier
            let api_key = config.resolve_api_key()?;

            match cmd {
                Command::Report(args) => {
                    commands::execute_report(args, api_key, &config, &data_dir, &formatter)
                        .await?;
                }
                Command::Evaluate(args) => {
                    commands::execute_evaluate(args, api_key, &config, &data_dir, &formatter)
                        .await?;
                }
                _ => unreachable!(),
            }
        }
    }

    Ok(())
}
