//! hive-ctl — entry point.
//!
//! ```text
//! hive-ctl                    Prompt for host and tx/rx ports
//! hive-ctl -d|--use-defaults  Run non-interactively with discovered defaults
//! hive-ctl -h|--help          Show usage and exit
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use hive_ctl::app;
use hive_ctl::config::{CtlConfig, CONFIG_FILE};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hive-ctl", about = "Drive a drone traffic generator through a demo run")]
struct Cli {
    /// Run using default values instead of prompting.
    #[arg(short = 'd', long)]
    use_defaults: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = CtlConfig::load(Path::new(CONFIG_FILE));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match app::run(config, cli.use_defaults).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("run failed: {e}");
            ExitCode::from(1)
        }
    }
}
