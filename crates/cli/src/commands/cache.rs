use clap::Subcommand;
use conformer_cache::{CacheStore, CompressionConfig};
use conformer_config::RunnerConfig;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show live entries, frames on disk and file size as JSON
    Stats {
        /// Directory holding cache.store
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
    /// Drop every cached outcome
    Clear {
        /// Directory holding cache.store
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
    /// Rewrite the cache file without superseded records
    Compact {
        /// Directory holding cache.store
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
}

impl CacheCommands {
    pub fn execute(self, config: RunnerConfig) -> eyre::Result<()> {
        match self {
            CacheCommands::Stats { cache_dir } => {
                let store = open_store(&config, cache_dir)?;
                println!("{}", serde_json::to_string_pretty(&store.stats())?);
                Ok(())
            }
            CacheCommands::Clear { cache_dir } => {
                let store = open_store(&config, cache_dir)?;
                let removed = store.len();
                store.clear()?;
                tracing::info!(removed, path = %store.path().display(), "cache cleared");
                Ok(())
            }
            CacheCommands::Compact { cache_dir } => {
                let store = open_store(&config, cache_dir)?;
                store.compact()?;
                Ok(())
            }
        }
    }
}

fn open_store(config: &RunnerConfig, cache_dir: Option<PathBuf>) -> eyre::Result<CacheStore> {
    let dir = cache_dir.unwrap_or_else(|| config.cache_dir.clone());
    let compression = if config.compression {
        CompressionConfig::default()
    } else {
        CompressionConfig::disabled()
    };
    Ok(CacheStore::open(&dir, compression)?)
}
