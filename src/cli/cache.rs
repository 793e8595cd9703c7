use std::time::Duration;

use action_cache::ActionCache;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::fs;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheAction {
    /// List cached action resolutions
    Show,

    /// Delete the cache file
    Clear,

    /// Drop entries older than the TTL and rewrite the file
    Prune {
        /// Maximum entry age, e.g. "30m" or "2h" (defaults to cache.ttl_secs)
        #[arg(long, value_parser = humantime::parse_duration)]
        ttl: Option<Duration>,
    },
}

pub async fn cmd_cache(args: CacheArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config().cache.path.as_path();
    match args.action {
        CacheAction::Show => {
            let cache = ActionCache::new();
            cache.restore(path).await;
            println!("{} cached action(s) in {}", cache.len(), path.display());
            for entry in cache.entries() {
                println!(
                    "  {}  {}  -> {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.fingerprint,
                    entry.descriptor
                );
            }
        }
        CacheAction::Clear => {
            if fs::try_exists(path).await.unwrap_or(false) {
                fs::remove_file(path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                println!("Removed {}", path.display());
            } else {
                println!("No cache file at {}", path.display());
            }
        }
        CacheAction::Prune { ttl } => {
            let ttl = ttl.unwrap_or_else(|| ctx.config().cache_ttl());
            let cache = ActionCache::new();
            cache.restore(path).await;
            let removed = cache.prune_expired(ttl);
            cache.persist(path).await;
            println!(
                "Pruned {removed} entr{} older than {}; {} left",
                if removed == 1 { "y" } else { "ies" },
                humantime::format_duration(ttl),
                cache.len()
            );
        }
    }
    Ok(())
}
