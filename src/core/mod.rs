//! Core data model.
//!
//! The foundational types the rest of the crate is built on: component
//! names, versions and constraints, rule expressions, the build environment,
//! and the manifest model with its fixed schema.

pub mod env;
pub mod manifest;
pub mod name;
pub mod rules;
pub mod schema;
pub mod version;

pub use env::BuildEnvironment;
pub use manifest::{
    DependencyDeclaration, DependencySource, Manifest, ManifestManager, ProjectRequirements,
    Visibility, MANIFEST_FILENAME,
};
pub use name::ComponentName;
pub use rules::Rule;
pub use version::{ComponentVersion, Constraint};
