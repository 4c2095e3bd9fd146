use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

mod commands;

use commands::{DeleteCommand, GetCommand, PutCommand, ServeCommand};

#[derive(Parser)]
#[command(name = "tablekv", version, about = "Key-value store over an SQL table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP routes
    Serve(ServeCommand),
    /// Read a key
    Get(GetCommand),
    /// Write a key
    Put(PutCommand),
    /// Delete a key
    Delete(DeleteCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => cmd.run().await,
        Commands::Get(cmd) => cmd.run().await,
        Commands::Put(cmd) => cmd.run().await,
        Commands::Delete(cmd) => cmd.run().await,
    }
}
