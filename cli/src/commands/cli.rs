use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mirrors the host application's conversations into daily history logs and
/// answers protocol requests on stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "histbridge", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of the default lookup.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the stdio bridge (the default).
    Serve,
    /// Print the resolved store and history paths as JSON.
    Paths,
}
