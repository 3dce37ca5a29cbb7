// Scrim bot entry point.
//
// With no arguments: initialize file logging, load config, wire the
// scheduling-service client and the Discord dispatcher, then tick until
// Ctrl+C. With a subcommand: run one mutation, print the outcome and exit.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use scrimbot_app::cli::{self, Cli, Command};
use scrimbot_app::service;
use scrimbot_core::config;

const DEFAULT_FILTER: &str =
    "scrimbot=info,scrimbot_core=info,scrimbot_gankster=info,scrimbot_notify=info,scrimbot_app=info,warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().into_command() {
        Command::Run => run().await,
        command => run_once(command).await,
    }
}

async fn run() -> anyhow::Result<()> {
    init_tracing(true)?;
    info!("scrimbot starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        interval_secs = config.polling.interval_secs,
        channel = %config.discord.channel_id,
        "config loaded"
    );

    let service = service::build(&config).await?;
    let period = Duration::from_secs(config.polling.interval_secs);

    service
        .run(period, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("scrimbot shut down cleanly");
    Ok(())
}

async fn run_once(command: Command) -> anyhow::Result<()> {
    init_tracing(false)?;

    let config = config::load_config().context("failed to load configuration")?;
    let client = service::connect_source(&config).await?;

    match cli::execute(&client, &command).await {
        Ok(Some(message)) => {
            println!("{message}");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("{}: {}", e.kind, e.description());
            std::process::exit(1);
        }
    }
}

/// Daemon runs log to `logs/scrimbot.log`; one-shot commands log to stderr.
fn init_tracing(to_file: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if to_file {
        let log_dir = std::env::current_dir()?.join("logs");
        std::fs::create_dir_all(&log_dir)?;
        let log_file = std::fs::File::create(log_dir.join("scrimbot.log"))?;

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")?;
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")?;
    }

    Ok(())
}
