//! Git remote source.
//!
//! The component is the repository (or a subdirectory of it) at the remote's
//! default branch head. The checkout's content hash keys the cache entry, so
//! a moved branch head is picked up as a new version.

use std::path::{Path, PathBuf};

use git2::Repository;
use tempfile::TempDir;

use crate::core::{BuildEnvironment, ComponentName, ComponentVersion, ManifestManager};
use crate::sources::{Source, SourceError, VersionCandidate};
use crate::util::fs::copy_dir_all;
use crate::util::hash::sha256_dir;

pub struct GitSource {
    url: String,
    /// Subdirectory of the checkout holding the component, if any.
    path: Option<String>,
}

impl GitSource {
    pub fn new(url: String, path: Option<String>) -> Self {
        GitSource { url, path }
    }

    fn unavailable(&self, reason: impl ToString) -> SourceError {
        SourceError::Unavailable {
            origin: self.name(),
            reason: reason.to_string(),
        }
    }

    /// Clone the remote into a scratch directory and return it together with
    /// the head commit id.
    fn checkout(&self) -> Result<(TempDir, String), SourceError> {
        let scratch = TempDir::new().map_err(|e| self.unavailable(e))?;

        tracing::debug!(url = %self.url, "cloning git source");
        let repo = Repository::clone(&self.url, scratch.path())
            .map_err(|e| self.unavailable(format!("failed to clone: {}", e.message())))?;

        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| self.unavailable(format!("failed to read HEAD: {}", e.message())))?;
        let commit = head.id().to_string();
        drop(head);
        drop(repo);

        // Repository metadata is not component content; dropping it here
        // keeps the content hash and the fetched tree consistent.
        crate::util::fs::remove_dir_all_if_exists(&scratch.path().join(".git"))
            .map_err(|e| self.unavailable(e))?;

        Ok((scratch, commit))
    }

    fn component_dir(&self, checkout: &Path) -> PathBuf {
        match &self.path {
            Some(sub) => checkout.join(sub),
            None => checkout.to_path_buf(),
        }
    }
}

impl Source for GitSource {
    fn name(&self) -> String {
        match &self.path {
            Some(sub) => format!("git:{} ({sub})", self.url),
            None => format!("git:{}", self.url),
        }
    }

    fn versions(
        &self,
        name: &ComponentName,
        env: &BuildEnvironment,
    ) -> Result<Vec<VersionCandidate>, SourceError> {
        let (scratch, commit) = self.checkout()?;
        let dir = self.component_dir(scratch.path());
        if !dir.is_dir() {
            return Err(SourceError::NotFound {
                component: name.to_string(),
                origin: self.name(),
            });
        }

        let manifest = ManifestManager::new(&dir, name.as_str())
            .load(env)
            .map_err(|e| SourceError::InvalidManifest {
                component: name.to_string(),
                origin: self.name(),
                message: e.to_string(),
            })?;

        let version = match manifest.version() {
            Some(v) => ComponentVersion::Semver(v.clone()),
            None => ComponentVersion::Revision(commit),
        };

        let component_hash = sha256_dir(&dir).map_err(|e| self.unavailable(e))?;

        Ok(vec![VersionCandidate {
            version,
            targets: manifest.targets().to_vec(),
            dependencies: manifest.dependencies().values().cloned().collect(),
            component_hash: Some(component_hash),
        }])
    }

    fn fetch(
        &self,
        name: &ComponentName,
        _version: &ComponentVersion,
        dest: &Path,
    ) -> Result<Option<String>, SourceError> {
        let (scratch, _commit) = self.checkout()?;
        let dir = self.component_dir(scratch.path());
        if !dir.is_dir() {
            return Err(SourceError::NotFound {
                component: name.to_string(),
                origin: self.name(),
            });
        }

        copy_dir_all(&dir, dest).map_err(|e| self.unavailable(e))?;

        let hash = sha256_dir(&dir).map_err(|e| self.unavailable(e))?;
        Ok(Some(hash))
    }
}
