use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use qsolive_lib::config::{Config, ConfigError, DEFAULT_CONFIG_PATH};
use qsolive_lib::contact::{Normalizer, SystemClock};
use qsolive_lib::delivery::{DeliveryError, SupabaseClient};
use qsolive_lib::logging;
use qsolive_lib::replay::{
    parse_delay, parse_offset_hours, run_replay, ReplayError, ReplayOptions, ReplaySummary,
};
use qsolive_lib::udp::{IngestLoop, ListenerError, ListenerState};

/// Relay logged QSOs from UDP ADIF packets to Supabase
#[derive(Debug, Parser)]
#[command(name = "qsolive", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Listen for ADIF datagrams and forward them (default command)
    Listen,
    /// Replay an ADIF log file with current timestamps
    Replay(ReplayArgs),
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// Path to the ADIF file
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    /// Mean seconds between sends (exponentially distributed)
    #[arg(long, default_value = "1.0", value_parser = parse_delay)]
    delay: Duration,

    /// Maximum number of records to send
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// Number of simulated operators
    #[arg(long, default_value_t = 1)]
    clients: usize,

    /// Hours to subtract from the current time (e.g. 2.5 for 2.5 hours ago)
    #[arg(long, default_value = "0", value_parser = parse_offset_hours)]
    offset: TimeDelta,
}

/// Anything that ends the process with a non-zero status
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error(transparent)]
    Client(#[from] DeliveryError),
    #[error(transparent)]
    Bind(#[from] ListenerError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging isn't up until this succeeds
    let config = match startup(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)
        .and_then(|runtime| {
            runtime.block_on(async move {
                match cli.command.unwrap_or(Command::Listen) {
                    Command::Listen => listen(config).await,
                    Command::Replay(args) => replay(config, args).await.map(|_| ()),
                }
            })
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            if matches!(e, StartupError::Bind(_)) {
                log::error!("Is another instance running? Is the port already in use?");
            }
            ExitCode::FAILURE
        }
    }
}

/// Load the configuration and start logging
fn startup(config_path: &Path) -> Result<Config, StartupError> {
    let config = Config::from_file(config_path)?;
    logging::init_logging(&config.log_level, &config.log_file).map_err(|e| StartupError::LogFile {
        path: config.log_file.clone(),
        source: e,
    })?;
    Ok(config)
}

async fn listen(config: Config) -> Result<(), StartupError> {
    log::info!("{}", "=".repeat(60));
    log::info!("QSOlive Client Started");
    log::info!("Operator: {}", config.operator_callsign().unwrap_or_default());
    log::info!("Supabase: {}", config.supabase_url);
    log::info!("{}", "=".repeat(60));

    let sink = SupabaseClient::new(&config.supabase_url, &config.supabase_key)?;

    let state = Arc::new(ListenerState::new());
    let ingest = IngestLoop::bind(
        &config.udp_address(),
        Normalizer::new(config.operator_callsign()),
        sink,
        config.retry_policy(),
        Arc::clone(&state),
    )
    .await?;

    let signal_state = Arc::clone(&state);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Shutting down...");
                signal_state.stop();
            }
            Err(e) => log::error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    log::info!("Waiting for UDP ADIF packets...");
    log::info!("Press Ctrl+C to stop");

    ingest.run().await;

    log::info!("QSOlive client stopped");
    Ok(())
}

async fn replay(config: Config, args: ReplayArgs) -> Result<ReplaySummary, StartupError> {
    log::info!("Loaded config for Supabase: {}", config.supabase_url);

    let sink = SupabaseClient::new(&config.supabase_url, &config.supabase_key)?;

    let options = ReplayOptions {
        file: args.file,
        delay: args.delay,
        limit: args.limit,
        clients: args.clients,
        offset: args.offset,
    };

    let summary = run_replay(
        &options,
        &Normalizer::new(None),
        &sink,
        &SystemClock,
        &mut rand::rng(),
    )
    .await?;

    log::info!(
        "Replay finished: {} sent, {} OK, {} failed",
        summary.sent,
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}
