//! Local directory source.
//!
//! A component living in a directory on disk, used in place rather than
//! copied into the cache. Its one available version is whatever the manifest
//! in that directory declares.

use std::path::{Path, PathBuf};

use crate::core::{BuildEnvironment, ComponentName, ComponentVersion, ManifestManager};
use crate::sources::{Source, SourceError, VersionCandidate};

pub struct LocalSource {
    path: PathBuf,
}

impl LocalSource {
    pub fn new(path: PathBuf) -> Self {
        LocalSource { path }
    }
}

impl Source for LocalSource {
    fn name(&self) -> String {
        format!("local:{}", self.path.display())
    }

    fn versions(
        &self,
        name: &ComponentName,
        env: &BuildEnvironment,
    ) -> Result<Vec<VersionCandidate>, SourceError> {
        if !self.path.is_dir() {
            return Err(SourceError::NotFound {
                component: name.to_string(),
                origin: self.name(),
            });
        }

        let manifest = ManifestManager::new(&self.path, name.as_str())
            .load(env)
            .map_err(|e| SourceError::InvalidManifest {
                component: name.to_string(),
                origin: self.name(),
                message: e.to_string(),
            })?;

        let version = match manifest.version() {
            Some(v) => ComponentVersion::Semver(v.clone()),
            None => ComponentVersion::Any,
        };

        Ok(vec![VersionCandidate {
            version,
            targets: manifest.targets().to_vec(),
            dependencies: manifest.dependencies().values().cloned().collect(),
            component_hash: None,
        }])
    }

    // Local components are consumed where they live; nothing to copy.
    fn fetch(
        &self,
        _name: &ComponentName,
        _version: &ComponentVersion,
        _dest: &Path,
    ) -> Result<Option<String>, SourceError> {
        Ok(None)
    }
}
