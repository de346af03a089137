use clap::Parser;
use conformer_config::{ConfigLoader, RunnerConfig};
use std::path::PathBuf;

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "conformer")]
#[command(about = "Run conformance tests with cached outcomes", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (CONFORMER_* variables still apply on top)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn load_config(&self) -> conformer_core::Result<RunnerConfig> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::new().file(path),
            None => ConfigLoader::new(),
        };
        loader.load()
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    conformer_utils::tracing::init().map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    let cli = Cli::parse();
    let config = cli.load_config()?;
    cli.command.execute(config).await
}
