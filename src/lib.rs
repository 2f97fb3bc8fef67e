//! Wharf - a dependency manager for embedded firmware components.
//!
//! This crate implements the resolution engine: manifest parsing and
//! validation, conditional dependency rules, version constraint solving,
//! lock file handling and the downloaded-component cache.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

pub use crate::core::{
    BuildEnvironment, ComponentName, ComponentVersion, Constraint, Manifest, ManifestManager,
    ProjectRequirements,
};
pub use ops::{Lockfile, LOCK_FILENAME};
pub use resolver::{ResolveError, Resolver};
pub use sources::ComponentCache;

/// A failure that indicates a bug in this program rather than a problem with
/// the user's project or environment. The CLI reports these with a distinct
/// exit code.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {0}")]
pub struct InternalError(pub String);
