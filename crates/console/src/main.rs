//! `permsh` entry point.
//!
//! Runs `-e` commands in order, or reads lines from stdin until `quit` or
//! end of input.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use command_core::CommandSource;
use perm_console::config::default_snapshot_file;
use perm_console::{ConsoleConfig, Reply, Shell};
use permission_core::SubjectReference;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Administer subject permissions from the terminal
#[derive(Parser)]
#[command(name = "permsh")]
#[command(about = "Interactive permission administration shell", long_about = None)]
#[command(version)]
struct Cli {
    /// Run commands as this subject instead of the console
    #[arg(long = "as", value_name = "SUBJECT")]
    source: Option<SubjectReference>,

    /// Prompt printed before each line
    #[arg(long)]
    prompt: Option<String>,

    /// Snapshot file to load at startup and export to
    #[arg(long, value_name = "FILE", conflicts_with = "persist")]
    snapshot: Option<PathBuf>,

    /// Use the platform data directory for the snapshot file
    #[arg(long)]
    persist: bool,

    /// Run these commands and exit
    #[arg(short = 'e', long = "execute", value_name = "COMMAND")]
    execute: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::from_env();
    if cli.source.is_some() {
        config.source = cli.source;
    }
    if let Some(prompt) = cli.prompt {
        config.prompt = prompt;
    }
    if let Some(path) = cli.snapshot {
        config.snapshot_file = Some(path);
    } else if cli.persist {
        config.snapshot_file = Some(default_snapshot_file());
    }

    let prompt = config.prompt.clone();
    let shell = Shell::new(config)?;
    match shell.source().subject() {
        Some(subject) => tracing::info!(%subject, "shell ready, running as subject"),
        None => tracing::debug!(source = shell.source().name(), "shell ready"),
    }

    if !cli.execute.is_empty() {
        for line in &cli.execute {
            if !print_reply(shell.execute(line).await) {
                break;
            }
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{prompt}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if !print_reply(shell.execute(&line).await) {
            break;
        }
    }

    tracing::info!("shell closed");
    Ok(())
}

/// Prints `reply`; false once the shell should stop.
fn print_reply(reply: Reply) -> bool {
    match reply {
        Reply::Output(lines) => {
            for line in lines {
                println!("{line}");
            }
            true
        }
        Reply::Error(message) => {
            eprintln!("{message}");
            true
        }
        Reply::Quit => false,
    }
}
