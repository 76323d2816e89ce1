//! obsws: command-line client for OBS Studio's WebSocket server.
//!
//! # Usage
//!
//! ```text
//! obsws [OPTIONS] <COMMAND>
//!
//! Commands:
//!   version        Print OBS and obs-websocket versions
//!   stats          Print performance statistics
//!   stream-status  Print the stream output status
//!   scenes         List scenes and the current program scene
//!   set-scene      Switch the program scene
//!   toggle-stream  Start or stop the stream
//!   toggle-mute    Toggle an input's mute state
//!   mute-status    Print the mute state of several inputs
//!   request        Send any request type by name
//!   events         Print events as they arrive
//!
//! Options:
//!   --config <PATH>             Config file [default: platform config dir]
//!   --host <HOST>               Server host
//!   --port <PORT>               Server port
//!   --password <PASSWORD>       Server password
//!   --subscriptions <NAMES>     Event categories, comma separated
//!   --log-level <FILTER>        Log filter when RUST_LOG is unset
//! ```
//!
//! # Precedence
//!
//! Command-line flag, then `OBSWS_*` environment variable, then the config
//! file, then the built-in default.
//!
//! | Variable              | Flag              |
//! |-----------------------|-------------------|
//! | `OBSWS_CONFIG`        | `--config`        |
//! | `OBSWS_HOST`          | `--host`          |
//! | `OBSWS_PORT`          | `--port`          |
//! | `OBSWS_PASSWORD`      | `--password`      |
//! | `OBSWS_SUBSCRIPTIONS` | `--subscriptions` |
//! | `OBSWS_LOG`           | `--log-level`     |
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use obsws_cli::{
    default_config_path, event_to_json, execute, load_config, tail_events, FileConfig, Overrides,
    Query,
};
use obsws_client::ObsClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line client for OBS Studio's WebSocket server (protocol v5).
#[derive(Debug, Parser)]
#[command(name = "obsws", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "OBSWS_CONFIG")]
    config: Option<PathBuf>,

    /// Hostname or IP address of the machine running OBS.
    #[arg(long, env = "OBSWS_HOST")]
    host: Option<String>,

    /// obs-websocket server port.
    #[arg(long, env = "OBSWS_PORT")]
    port: Option<u16>,

    /// Server password; only used if the server asks for authentication.
    #[arg(long, env = "OBSWS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Event categories to subscribe to, e.g. `Scenes,Outputs`.
    #[arg(long, env = "OBSWS_SUBSCRIPTIONS", value_delimiter = ',')]
    subscriptions: Option<Vec<String>>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "OBSWS_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Query(Query),

    /// Print events as they arrive, one JSON object per line.
    ///
    /// Events whose type the client does not know are always printed.
    Events {
        /// Event types to print, e.g. `CurrentProgramSceneChanged`.
        event_types: Vec<String>,

        /// Exit after this many events.
        #[arg(long)]
        count: Option<usize>,
    },
}

impl Cli {
    /// Splits the parsed arguments into the file path, overrides, and command.
    ///
    /// The path is `None` when no `--config` was given and the platform has
    /// no config directory; the defaults apply then.
    fn into_parts(self) -> (Option<PathBuf>, Overrides, Command) {
        let path = self.config.or_else(|| default_config_path().ok());
        let overrides = Overrides {
            host: self.host,
            port: self.port,
            password: self.password,
            subscriptions: self.subscriptions,
            log_level: self.log_level,
        };
        (path, overrides, self.command)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (path, overrides, command) = Cli::parse().into_parts();

    let mut file_config = match &path {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FileConfig::default(),
    };
    file_config.apply(overrides);

    init_logging(&file_config);

    let client_config = file_config
        .to_client_config()
        .context("invalid connection settings")?;
    info!(url = %client_config.url, "connecting to OBS");

    let client = ObsClient::with_websocket(client_config);
    client
        .connect_and_identify()
        .await
        .context("failed to connect to OBS")?;

    let outcome = run(&client, command).await;

    if let Err(e) = client.disconnect().await {
        warn!(error = %e, "disconnect failed");
    }
    outcome
}

async fn run(client: &ObsClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Query(query) => {
            let value = execute(client, query).await?;
            let text = serde_json::to_string_pretty(&value)?;
            println!("{text}");
        }
        Command::Events { event_types, count } => {
            let tail = tail_events(client, &event_types, count, |event| {
                println!("{}", event_to_json(event));
            });
            tokio::select! {
                () = tail => {}
                result = tokio::signal::ctrl_c() => {
                    result.context("failed to listen for Ctrl+C")?;
                    info!("interrupted");
                }
            }
        }
    }
    Ok(())
}

/// Installs the `tracing` subscriber.  `RUST_LOG` wins over the configured
/// level.
fn init_logging(config: &FileConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
