//! Fetch-cache commands — `pricemap cache`.

use anyhow::{Context, Result};
use console::style;

use pricemap::config::Config;

use crate::CacheCommands;

pub fn cmd_cache(cfg: &Config, command: &CacheCommands) -> Result<()> {
    // Cache commands operate on the configured directory even when the
    // current invocation carries --no-cache.
    let cache = pricemap::cache::FetchCache::new(&cfg.cache_dir);
    match command {
        CacheCommands::Status => {
            let status = cache.status().context("Failed to read cache directory")?;
            println!("Cache directory: {}", cache.dir().display());
            println!("Entries: {}", status.entries);
            println!("Size: {} bytes", status.bytes);
        }
        CacheCommands::Clear => {
            cache
                .invalidate_all()
                .context("Failed to clear fetch cache")?;
            println!("{} fetch cache at {}", style("Cleared").green().bold(), cache.dir().display());
        }
    }
    Ok(())
}
