//! The build environment threaded through validation and resolution.
//!
//! Target and toolchain version are supplied by the caller rather than read
//! ambiently, so the engine stays testable without process environment
//! mutation. Absence of a value is an error only at the point a rule or the
//! solver actually needs it.

use semver::Version;
use thiserror::Error;

/// Environment variable overriding the known target list (comma-separated).
pub const KNOWN_TARGETS_ENV: &str = "WHARF_KNOWN_TARGETS";

/// Stock build targets recognized in `targets:` lists and rule expressions.
pub const DEFAULT_KNOWN_TARGETS: &[&str] = &[
    "esp32", "esp32s2", "esp32s3", "esp32c2", "esp32c3", "esp32c6", "esp32h2", "linux",
];

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("build target is not set but `{0}` requires it")]
    MissingTarget(String),

    #[error("toolchain version is not set but `{0}` requires it")]
    MissingToolchainVersion(String),
}

/// Immutable binding of the values rule evaluation and resolution consume.
#[derive(Debug, Clone, Default)]
pub struct BuildEnvironment {
    target: Option<String>,
    idf_version: Option<Version>,
}

impl BuildEnvironment {
    pub fn new(target: impl Into<String>, idf_version: Version) -> Self {
        BuildEnvironment {
            target: Some(target.into()),
            idf_version: Some(idf_version),
        }
    }

    /// An environment with neither value bound.
    pub fn unbound() -> Self {
        BuildEnvironment::default()
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_idf_version(mut self, version: Version) -> Self {
        self.idf_version = Some(version);
        self
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn idf_version(&self) -> Option<&Version> {
        self.idf_version.as_ref()
    }

    /// The target, or an error naming the construct that needed it.
    pub fn require_target(&self, needed_by: &str) -> Result<&str, EnvError> {
        self.target
            .as_deref()
            .ok_or_else(|| EnvError::MissingTarget(needed_by.to_string()))
    }

    /// The toolchain version, or an error naming the construct that needed it.
    pub fn require_idf_version(&self, needed_by: &str) -> Result<&Version, EnvError> {
        self.idf_version
            .as_ref()
            .ok_or_else(|| EnvError::MissingToolchainVersion(needed_by.to_string()))
    }
}

/// Targets accepted in manifests, from the override variable or the defaults.
pub fn known_targets() -> Vec<String> {
    if let Ok(value) = std::env::var(KNOWN_TARGETS_ENV) {
        let targets: Vec<String> = value
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !targets.is_empty() {
            return targets;
        }
    }

    DEFAULT_KNOWN_TARGETS.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_values() {
        let env = BuildEnvironment::unbound();
        assert!(env.require_target("target == esp32").is_err());
        assert!(env.require_idf_version("idf_version >= 5").is_err());

        let env = BuildEnvironment::new("esp32", Version::new(5, 0, 0));
        assert_eq!(env.require_target("x").unwrap(), "esp32");
        assert_eq!(*env.require_idf_version("x").unwrap(), Version::new(5, 0, 0));
    }

    #[test]
    fn test_default_known_targets() {
        let targets = known_targets();
        assert!(targets.iter().any(|t| t == "esp32"));
        assert_eq!(targets.len(), DEFAULT_KNOWN_TARGETS.len());
    }
}
