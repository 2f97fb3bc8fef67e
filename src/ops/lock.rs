//! The lock file.
//!
//! `dependencies.lock` records the exact result of one resolution: every
//! component with its version, source and content hash, plus the manifest
//! hash and target the solution was computed for. The byte form is
//! canonical: YAML with every mapping's keys in alphabetical order, so equal
//! solutions always serialize to equal bytes. An empty or missing file is a
//! valid unresolved state, not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{ComponentName, ProjectRequirements};
use crate::resolver::{SolvedComponent, Solution};
use crate::util::fs::write_atomic;

/// Canonical lock filename inside a project directory.
pub const LOCK_FILENAME: &str = "dependencies.lock";

/// Version of the lock format itself.
pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("cannot read lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse lock file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Internal(#[from] crate::InternalError),
}

/// A parsed lock file.
///
/// Fields are declared in alphabetical order so serialization emits the
/// canonical key order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<ComponentName, SolvedComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub version: String,
}

impl Lockfile {
    /// The unresolved state: nothing pinned yet.
    pub fn unresolved() -> Self {
        Lockfile {
            version: FORMAT_VERSION.to_string(),
            ..Lockfile::default()
        }
    }

    /// Build the lock for a computed solution.
    pub fn from_solution(
        solution: Solution,
        requirements: &ProjectRequirements,
        target: Option<&str>,
    ) -> Self {
        Lockfile {
            dependencies: solution,
            manifest_hash: Some(requirements.manifest_hash()),
            target: target.map(str::to_string),
            version: FORMAT_VERSION.to_string(),
        }
    }

    /// Whether this lock holds a solution at all.
    pub fn is_resolved(&self) -> bool {
        self.manifest_hash.is_some()
    }

    /// Load a lock file. Missing and empty files are the unresolved state.
    pub fn load(path: &Path) -> Result<Self, LockError> {
        if !path.exists() {
            return Ok(Lockfile::unresolved());
        }
        let content = std::fs::read_to_string(path).map_err(|e| LockError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Lockfile::unresolved());
        }

        serde_yaml::from_str(&content).map_err(|e| LockError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The canonical byte form.
    pub fn to_yaml(&self) -> Result<String, crate::InternalError> {
        // Struct and map key orders are already alphabetical.
        serde_yaml::to_string(self)
            .map_err(|e| crate::InternalError(format!("lock serialization failed: {e}")))
    }

    /// Write atomically, so a concurrent reader never sees a partial lock.
    pub fn save(&self, path: &Path) -> Result<(), LockError> {
        let yaml = self.to_yaml()?;
        write_atomic(path, yaml.as_bytes()).map_err(|e| LockError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BuildEnvironment, ComponentVersion, Manifest};
    use crate::sources::ComponentSource;
    use tempfile::TempDir;

    fn name(s: &str) -> ComponentName {
        ComponentName::parse(s).unwrap()
    }

    fn requirements(yaml: &str) -> ProjectRequirements {
        let env = BuildEnvironment::new("esp32", "4.4.4".parse().unwrap());
        ProjectRequirements::new(vec![Manifest::parse(yaml, "main", None, &env).unwrap()])
    }

    #[test]
    fn test_minimal_lock_bytes() {
        let lock = Lockfile {
            dependencies: BTreeMap::new(),
            manifest_hash: Some("X".to_string()),
            target: Some("esp32".to_string()),
            version: FORMAT_VERSION.to_string(),
        };
        assert_eq!(
            lock.to_yaml().unwrap(),
            "manifest_hash: X\ntarget: esp32\nversion: 1.0.0\n"
        );
    }

    #[test]
    fn test_full_lock_bytes_are_canonical() {
        let mut solution: Solution = BTreeMap::new();
        solution.insert(
            name("idf"),
            SolvedComponent {
                component_hash: None,
                source: ComponentSource::Idf,
                version: ComponentVersion::Semver("4.4.4".parse().unwrap()),
            },
        );
        solution.insert(
            name("ns/cmp"),
            SolvedComponent {
                component_hash: Some("deadbeef".to_string()),
                source: ComponentSource::Service {
                    url: "https://repo.example/api".to_string(),
                },
                version: ComponentVersion::Semver("1.2.7".parse().unwrap()),
            },
        );
        let lock = Lockfile {
            dependencies: solution,
            manifest_hash: Some("abc123".to_string()),
            target: Some("esp32".to_string()),
            version: FORMAT_VERSION.to_string(),
        };

        let expected = "\
dependencies:
  idf:
    source:
      type: idf
    version: 4.4.4
  ns/cmp:
    component_hash: deadbeef
    source:
      service_url: https://repo.example/api
      type: service
    version: 1.2.7
manifest_hash: abc123
target: esp32
version: 1.0.0
";
        assert_eq!(lock.to_yaml().unwrap(), expected);
    }

    #[test]
    fn test_round_trip() {
        let mut solution: Solution = BTreeMap::new();
        solution.insert(
            name("cmp"),
            SolvedComponent {
                component_hash: Some("hash".to_string()),
                source: ComponentSource::Git {
                    url: "https://github.com/example/repo.git".to_string(),
                    path: None,
                },
                version: ComponentVersion::Semver("1.0.0".parse().unwrap()),
            },
        );
        let lock = Lockfile::from_solution(
            solution,
            &requirements("dependencies:\n  cmp: \"1.0.0\"\n"),
            Some("esp32"),
        );

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILENAME);
        lock.save(&path).unwrap();

        let loaded = Lockfile::load(&path).unwrap();
        assert_eq!(loaded, lock);
    }

    #[test]
    fn test_missing_and_empty_files_are_unresolved() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILENAME);

        let missing = Lockfile::load(&path).unwrap();
        assert!(!missing.is_resolved());

        std::fs::write(&path, "\n").unwrap();
        let empty = Lockfile::load(&path).unwrap();
        assert!(!empty.is_resolved());
        assert_eq!(empty.version, FORMAT_VERSION);
    }

    #[test]
    fn test_malformed_lock_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILENAME);
        std::fs::write(&path, "dependencies: [not, a, mapping]\n").unwrap();

        assert!(matches!(
            Lockfile::load(&path),
            Err(LockError::Parse { .. })
        ));
    }

    #[test]
    fn test_save_is_byte_stable() {
        let lock = Lockfile::from_solution(
            BTreeMap::new(),
            &requirements("dependencies:\n  idf: \"4.4.4\"\n"),
            Some("esp32"),
        );

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILENAME);
        lock.save(&path).unwrap();
        let first = std::fs::read(&path).unwrap();
        lock.save(&path).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }
}
