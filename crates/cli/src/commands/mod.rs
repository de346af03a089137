use clap::Subcommand;
use conformer_config::RunnerConfig;

pub mod cache;
pub mod run;

use self::cache::CacheCommands;
use self::run::RunArgs;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test files and print one JSON outcome per file
    Run(RunArgs),

    /// Inspect or reset the outcome cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

impl Commands {
    pub async fn execute(self, config: RunnerConfig) -> eyre::Result<()> {
        match self {
            Commands::Run(args) => args.execute(config).await,
            Commands::Cache { command } => command.execute(config),
        }
    }
}
