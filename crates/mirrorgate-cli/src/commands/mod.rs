//! CLI commands and argument parsing.

pub mod probe;
pub mod resolve;

use clap::{Parser, Subcommand};

/// Mirrorgate - container image resolution through a mirror registry
#[derive(Parser)]
#[command(name = "mirrorgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve image references
    Resolve(resolve::ResolveArgs),

    /// Check whether the mirror registry is usable
    Probe(probe::ProbeArgs),

    /// Print version information
    Version,
}

/// Output format shared by the commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
