//! neosup CLI - supervise an externally installed Neo4j server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use neosup::Supervisor;

#[derive(Parser)]
#[command(name = "neosup", version, about = "Supervise an installed Neo4j server")]
struct Cli {
    /// Path to the Neo4j installation directory.
    #[arg(short, long, env = "NEO4J_HOME")]
    path: PathBuf,

    /// Declared server version (selects the config layout).
    #[arg(short = 'V', long, env = "NEO4J_VERSION", default_value = "3.0.0")]
    server_version: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server and wait until it accepts connections.
    Start,
    /// Stop the server.
    Stop,
    /// Restart the server and wait until it accepts connections.
    Restart,
    /// Report whether the server is running, and its pid.
    Status,
    /// Print the server's HTTP endpoint.
    Endpoint,
    /// Read, write, or delete a config key.
    Config {
        key: String,
        /// New value; omit to read the current one.
        value: Option<String>,
        /// Delete the key instead.
        #[arg(long, conflicts_with = "value")]
        delete: bool,
    },
    /// Wipe the data directory, pausing and resuming a running server.
    Clean,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let server = Supervisor::new(&cli.path, &cli.server_version)
        .with_context(|| format!("Failed to create supervisor for {}", cli.path.display()))?;

    match cli.command {
        Command::Start => {
            let output = server.start().await?;
            print!("{output}");
        }
        Command::Stop => {
            let output = server.stop().await?;
            print!("{output}");
        }
        Command::Restart => {
            let output = server.restart().await?;
            print!("{output}");
        }
        Command::Status => {
            if server.running().await? {
                match server.pid().await? {
                    Some(pid) => println!("running (pid {pid})"),
                    None => println!("running"),
                }
            } else {
                println!("not running");
            }
        }
        Command::Endpoint => {
            let endpoint = server.endpoint().await?;
            println!("{}{}", endpoint.server, endpoint.endpoint);
        }
        Command::Config { key, value, delete } => {
            if delete {
                server.delete_config(&key).await?;
            } else if let Some(value) = value {
                server.set_config(&key, &value).await?;
            } else {
                println!("{}", server.config(&key).await?);
            }
        }
        Command::Clean => {
            server.clean().await?;
            println!("data directory reset");
        }
    }

    Ok(())
}
