//! Command implementations.

pub mod cache;
pub mod resolve;
pub mod schema;
pub mod validate;

use anyhow::{anyhow, Result};
use wharf::core::version::parse_version_lenient;
use wharf::{BuildEnvironment, ComponentCache};

use crate::cli::ProjectArgs;

/// The build environment described by the command line.
pub fn build_environment(args: &ProjectArgs) -> Result<BuildEnvironment> {
    let mut env = BuildEnvironment::unbound();
    if let Some(target) = &args.target {
        env = env.with_target(target);
    }
    if let Some(version) = &args.idf_version {
        let parsed = parse_version_lenient(version)
            .ok_or_else(|| anyhow!("invalid toolchain version: `{version}`"))?;
        env = env.with_idf_version(parsed);
    }
    Ok(env)
}

/// The cache named on the command line, or the per-user default.
pub fn open_cache(path: Option<std::path::PathBuf>) -> Result<ComponentCache> {
    let root = match path {
        Some(p) => p,
        None => ComponentCache::default_root()?,
    };
    Ok(ComponentCache::new(root))
}
