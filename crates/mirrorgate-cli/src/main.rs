//! Mirrorgate CLI - resolve container image references against a mirror registry.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirrorgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve(args) => commands::resolve::run(&args),
        Commands::Probe(args) => commands::probe::run(&args),
        Commands::Version => {
            println!("mirrorgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
