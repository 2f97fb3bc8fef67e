//! Resolution error types.

use std::fmt;

use thiserror::Error;

use crate::sources::SourceError;

/// One requirement that contributed to a resolution failure.
#[derive(Debug, Clone)]
pub struct Requirer {
    pub name: String,
    pub constraint: String,
}

/// Error during dependency resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Unresolvable(UnresolvableDependency),

    #[error(
        "component `{component}` ({version}) does not support target {target}; \
         supported targets: {}", supported.join(", ")
    )]
    UnsupportedTarget {
        component: String,
        version: String,
        target: String,
        supported: Vec<String>,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// No version satisfies the combined requirements on one component.
#[derive(Debug, Clone)]
pub struct UnresolvableDependency {
    pub component: String,
    pub requirers: Vec<Requirer>,
    pub available: Vec<String>,
}

impl fmt::Display for UnresolvableDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cannot find a version of `{}` satisfying all requirements:",
            self.component
        )?;
        for requirer in &self.requirers {
            writeln!(
                f,
                "  - `{}` requires `{}`",
                requirer.name, requirer.constraint
            )?;
        }
        if self.available.is_empty() {
            write!(f, "no versions are available")?;
        } else {
            write!(f, "available versions: {}", self.available.join(", "))?;
        }
        Ok(())
    }
}
