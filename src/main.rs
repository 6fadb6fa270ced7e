use altarb::cli::Cli;
use altarb::config::Config;
use altarb::supervisor;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.dry_run {
        config.dry_run = true;
    }

    config.init_logging();

    info!("altarb starting");

    let result = supervisor::run(config).await;

    match result {
        Ok(()) => {
            info!("altarb stopped");
        }
        Err(e) => {
            error!(error = %e, "fatal error during startup");
            std::process::exit(1);
        }
    }
}
