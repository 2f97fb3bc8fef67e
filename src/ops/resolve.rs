//! Project resolution: deciding whether a solve is needed and running it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{
    BuildEnvironment, ComponentName, ComponentVersion, ManifestManager, ProjectRequirements,
};
use crate::ops::fetch::{download_components, reclaim_cache};
use crate::ops::lock::{Lockfile, FORMAT_VERSION, LOCK_FILENAME};
use crate::resolver::Resolver;
use crate::sources::ComponentCache;

/// Subdirectory of a project holding additional locally-managed components.
pub const COMPONENTS_DIR: &str = "components";

/// Load the project manifest plus every component manifest under
/// `components/`.
pub fn load_requirements(
    project_dir: &Path,
    env: &BuildEnvironment,
) -> Result<ProjectRequirements> {
    let mut manifests = vec![ManifestManager::new(project_dir, "main").load(env)?];

    let components = project_dir.join(COMPONENTS_DIR);
    if components.is_dir() {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&components)
            .with_context(|| format!("failed to read {}", components.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        entries.sort();

        for dir in entries {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            manifests.push(ManifestManager::new(&dir, &name).load(env)?);
        }
    }

    Ok(ProjectRequirements::new(manifests))
}

/// Whether the lock still describes this project under this environment.
///
/// A solve is required when the lock is unresolved or in an unknown format,
/// when the manifest hash or target changed, or when the locked toolchain
/// component no longer matches the active toolchain version.
pub fn is_solve_required(
    requirements: &ProjectRequirements,
    env: &BuildEnvironment,
    lock: &Lockfile,
) -> bool {
    if !lock.is_resolved() || lock.version != FORMAT_VERSION {
        return true;
    }
    if lock.manifest_hash.as_deref() != Some(requirements.manifest_hash().as_str()) {
        return true;
    }
    if lock.target.as_deref() != env.target() {
        return true;
    }

    if let Ok(idf) = ComponentName::parse("idf") {
        if let Some(locked) = lock.dependencies.get(&idf) {
            match (&locked.version, env.idf_version()) {
                (ComponentVersion::Semver(locked), Some(current)) if locked != current => {
                    return true;
                }
                _ => {}
            }
        }
    }

    false
}

/// Resolve a project and materialize its components.
///
/// Solves only when the lock is stale; an up-to-date lock is reused as is.
/// The new lock is written atomically before anything is downloaded, and
/// cache entries the lock no longer references are reclaimed afterwards.
pub fn resolve_project(
    project_dir: &Path,
    env: &BuildEnvironment,
    cache: &ComponentCache,
) -> Result<Lockfile> {
    let requirements = load_requirements(project_dir, env)?;
    let lock_path = project_dir.join(LOCK_FILENAME);
    let lock = Lockfile::load(&lock_path)?;

    let lock = if is_solve_required(&requirements, env, &lock) {
        tracing::info!("solving dependencies");
        let solution = Resolver::new(env).solve(&requirements)?;
        let lock = Lockfile::from_solution(solution, &requirements, env.target());
        lock.save(&lock_path)?;
        lock
    } else {
        tracing::debug!("lock file is up to date");
        lock
    };

    download_components(&lock, env, cache)?;
    let removed = reclaim_cache(&lock, cache)?;
    if removed > 0 {
        tracing::debug!(removed, "reclaimed unreferenced cache entries");
    }
    Ok(lock)
}
