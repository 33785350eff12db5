mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cli::{ChatArgs, Cli, Commands};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    // The terminal belongs to the conversation, so logs always go to a file.
    let _guard = init_logging(cli.verbose);
    let config = config::CliConfig::load(cli.config.as_deref());

    let command = cli.command.take().unwrap_or(Commands::Chat(ChatArgs::default()));
    let result: Result<()> = match command {
        Commands::Chat(args) => commands::chat::run(&cli, &config, args).await,
        Commands::Send(args) => commands::send::run(&cli, &config, args).await,
        Commands::Config { command } => {
            commands::config::run(&config, cli.config.clone(), command, cli.format)
        }
        Commands::Completions { shell } => {
            completions::generate_completions(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        error::handle_error(err);
    }
}

fn log_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("NEXUS_LOG_DIR")
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::data_local_dir().map(|p| p.join("nexus").join("logs"))
}

fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("nexus")
        .filename_suffix("log")
        .build(log_dir)
        .ok()?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Some(guard)
}
