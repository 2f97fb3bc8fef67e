//! `wharf cache` - inspect and maintain the component cache.

use anyhow::Result;
use wharf::ops::{self, Lockfile, LOCK_FILENAME};

use crate::cli::{CacheArgs, CacheCommands};
use crate::commands::open_cache;

pub fn execute(args: CacheArgs) -> Result<()> {
    let cache = open_cache(args.cache_path)?;

    match args.command {
        CacheCommands::Path => {
            println!("{}", cache.root().display());
        }
        CacheCommands::Size => {
            println!("{}", cache.size()?);
        }
        CacheCommands::Clear => {
            cache.clear()?;
            println!("cache cleared");
        }
        CacheCommands::Reclaim { project_dir } => {
            let lock = Lockfile::load(&project_dir.join(LOCK_FILENAME))?;
            let removed = ops::reclaim_cache(&lock, &cache)?;
            println!("removed {removed} unreferenced entries");
        }
    }
    Ok(())
}
