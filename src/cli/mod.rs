//! Command-line interface: a single entrypoint with a handful of flags
//! layered over the config file, no subcommand tree. Grounded on the
//! teacher's `cli::Cli` derive shape, with the `Commands`
//! subcommand/`RunArgs`/service-management surface dropped.

use std::path::PathBuf;

use clap::Parser;

/// Latency-arbitrage engine for sports alt-total binary prediction markets.
#[derive(Parser, Debug)]
#[command(name = "altarb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Detect opportunities but don't execute trades
    #[arg(long)]
    pub dry_run: bool,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}
