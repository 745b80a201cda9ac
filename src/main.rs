//! zwassoc - Z-Wave association group tool
//!
//! Lists and edits association groups on Z-Wave nodes through a running
//! zwave-js-server instance.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{Config, TimeoutConfig};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use zwassoc_client::{Client, ConnectionConfig};
use zwassoc_protocol::{EventMessage, GroupId, NodeId};

/// Capacity of the event channel used by `listen`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(name = "zwassoc")]
#[command(about = "Manage Z-Wave association groups through zwave-js-server")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "ZWASSOC_CONFIG")]
    config: Option<PathBuf>,

    /// Server URL, e.g. ws://127.0.0.1:3000 (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and edit association groups
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },

    /// Check whether a node supports association management
    Supports {
        /// Node ID
        node_id: NodeId,
    },

    /// Show server and driver versions
    Version,

    /// Print server events as JSON lines until interrupted
    Listen,
}

#[derive(Subcommand)]
pub enum GroupCommand {
    /// List the association groups of a node
    List {
        /// Node ID
        node_id: NodeId,
    },

    /// Add nodes to an association group
    Add {
        /// Node ID
        node_id: NodeId,

        /// Group ID
        group_id: GroupId,

        /// Nodes to associate
        #[arg(required = true)]
        node_ids: Vec<NodeId>,
    },

    /// Remove nodes from an association group
    Remove {
        /// Node ID
        node_id: NodeId,

        /// Group ID
        group_id: GroupId,

        /// Nodes to remove; if omitted only the group is sent and the server
        /// decides what to remove
        node_ids: Vec<NodeId>,
    },

    /// Show Association Group Information for a group
    Info {
        /// Node ID
        node_id: NodeId,

        /// Group ID
        group_id: GroupId,

        /// Ask the device instead of using the server's cache
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref(), cli.server.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };
    tracing::debug!("Using server {}", config.server.url);

    // Only `listen` cares about events; everything else discards them.
    let mut connection_config = ConnectionConfig::new(&config.server.url);
    let events = if matches!(cli.command, Commands::Listen) {
        let (tx, rx) = broadcast::channel::<EventMessage>(EVENT_CHANNEL_CAPACITY);
        connection_config = connection_config.with_event_handler(tx);
        Some(rx)
    } else {
        None
    };

    let client = Client::connect(connection_config);
    if let Err(e) = prepare(&client, &config.timeouts).await {
        eprintln!("{}: {}", "Connection failed".red(), e);
        std::process::exit(1);
    }

    match (cli.command, events) {
        (Commands::Listen, Some(events)) => listen(&client, events).await?,
        (cmd, _) => {
            let timeout = config.timeouts.request();
            match tokio::time::timeout(timeout, commands::execute(&client, cmd)).await {
                Ok(Ok(output)) => println!("{}", output),
                Ok(Err(e)) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
                Err(_) => {
                    eprintln!(
                        "{}: no reply within {}s",
                        "Error".red(),
                        timeout.as_secs()
                    );
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Waits for the server's version message and the handshake.
async fn prepare(
    client: &Client,
    timeouts: &TimeoutConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let limit = timeouts.ready();

    let version = tokio::time::timeout(limit, client.version())
        .await
        .map_err(|_| format!("no version message within {}s", limit.as_secs()))?;
    eprintln!("{}", commands::format_version_line(&version).dimmed());

    tokio::time::timeout(limit, client.ready())
        .await
        .map_err(|_| format!("handshake did not finish within {}s", limit.as_secs()))??;
    tracing::debug!("Client ready");

    Ok(())
}

/// Streams events until Ctrl+C or until the connection drops.
async fn listen(
    client: &Client,
    mut events: broadcast::Receiver<EventMessage>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("{}", "Listening for events, press Ctrl+C to stop...".dimmed());
    let mut liveness = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(e) => println!("{}", serde_json::to_string(&e.event)?),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        eprintln!("{}: lagged {} events", "Warning".yellow(), n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = liveness.tick() => {
                if !client.is_connected() {
                    eprintln!("{}", "Connection closed".red());
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n{}", "Stopping...".dimmed());
                break;
            }
        }
    }

    Ok(())
}
