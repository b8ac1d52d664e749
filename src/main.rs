use clap::Parser;
use gaphound::app::App;
use gaphound::config::Config;
use tokio::signal;
use tracing::{error, info};

/// Cross-venue arbitrage scanner and two-leg trade executor.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Evaluate and size trades but place no orders.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if cli.dry_run {
        config.execution.dry_run = true;
    }

    config.init_logging();
    info!("gaphound starting");

    tokio::select! {
        result = App::run(config) => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("gaphound stopped");
}
