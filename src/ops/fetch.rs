//! Materializing locked components into the cache.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::core::{BuildEnvironment, ComponentName};
use crate::ops::lock::Lockfile;
use crate::resolver::SolvedComponent;
use crate::sources::{ComponentCache, ComponentSource, SourceError};

/// Upper bound on concurrent downloads.
const MAX_PARALLEL_FETCHES: usize = 4;

/// Cache key for one locked component: its content hash when the source
/// reported one, otherwise its version.
fn cache_key(solved: &SolvedComponent) -> String {
    solved
        .component_hash
        .clone()
        .unwrap_or_else(|| solved.version.to_string())
}

/// Download every locked component that is not in the cache yet.
///
/// Fetches run in a bounded worker pool. Each cache entry is populated
/// atomically, so a failure in one component leaves neither that entry nor
/// the rest of the cache half-written.
pub fn download_components(
    lock: &Lockfile,
    env: &BuildEnvironment,
    cache: &ComponentCache,
) -> Result<Vec<PathBuf>> {
    let tasks: Vec<(&ComponentName, &SolvedComponent)> = lock
        .dependencies
        .iter()
        .filter(|(_, solved)| {
            // Builtin and local components are used in place.
            !matches!(
                solved.source,
                ComponentSource::Idf | ComponentSource::Local { .. }
            )
        })
        .collect();

    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(MAX_PARALLEL_FETCHES.min(tasks.len()))
        .build()
        .context("failed to build download pool")?;

    pool.install(|| {
        tasks
            .par_iter()
            .map(|(name, solved)| {
                let source = solved.source.instantiate(env);
                let key = cache_key(solved);
                cache.ensure(name, &key, solved.component_hash.as_deref(), |dest| {
                    let actual = source.fetch(name, &solved.version, dest)?;
                    if let (Some(expected), Some(actual)) = (&solved.component_hash, &actual) {
                        if expected != actual {
                            return Err(SourceError::HashMismatch {
                                component: format!("{name}@{}", solved.version),
                                origin: source.name(),
                                expected: expected.clone(),
                                actual: actual.clone(),
                            });
                        }
                    }
                    Ok(actual)
                })
            })
            .collect()
    })
}

/// Delete cache entries no locked component references. Returns the number
/// of entries removed.
pub fn reclaim_cache(lock: &Lockfile, cache: &ComponentCache) -> Result<usize> {
    let referenced: BTreeSet<String> = lock
        .dependencies
        .iter()
        .map(|(name, solved)| ComponentCache::entry_name(name, &cache_key(solved)))
        .collect();

    cache.reclaim(&referenced)
}
