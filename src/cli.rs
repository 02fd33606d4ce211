//! Command-line interface for the aisov server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// aisov - AI share-of-visibility dashboard
#[derive(Parser)]
#[command(name = "aisov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (overrides the default search locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the dashboard server (default)
    Serve,

    /// Create a default config file
    Init,
}
