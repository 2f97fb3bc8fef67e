//! The toolchain builtin pseudo-component.
//!
//! `idf` is always provided by the active toolchain rather than downloaded.
//! Its single available version is the toolchain version, and fetching it is
//! a no-op.

use std::path::Path;

use semver::Version;

use crate::core::{BuildEnvironment, ComponentName, ComponentVersion};
use crate::sources::{Source, SourceError, VersionCandidate};

pub struct IdfSource {
    version: Option<Version>,
}

impl IdfSource {
    pub fn new(version: Option<Version>) -> Self {
        IdfSource { version }
    }
}

impl Source for IdfSource {
    fn name(&self) -> String {
        "idf".to_string()
    }

    fn versions(
        &self,
        _name: &ComponentName,
        env: &BuildEnvironment,
    ) -> Result<Vec<VersionCandidate>, SourceError> {
        let version = self
            .version
            .clone()
            .or_else(|| env.idf_version().cloned())
            .ok_or_else(|| SourceError::Unavailable {
                origin: self.name(),
                reason: "toolchain version is not set".to_string(),
            })?;

        Ok(vec![VersionCandidate {
            version: ComponentVersion::Semver(version),
            targets: Vec::new(),
            dependencies: Vec::new(),
            component_hash: None,
        }])
    }

    fn fetch(
        &self,
        _name: &ComponentName,
        _version: &ComponentVersion,
        _dest: &Path,
    ) -> Result<Option<String>, SourceError> {
        Ok(None)
    }
}
