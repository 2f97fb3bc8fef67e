//! The downloaded-component cache.
//!
//! Entries are directories keyed by component name and content identity, so
//! distinct versions never collide and a re-resolve can reuse whatever is
//! already present. Population is atomic: content is fetched into a scratch
//! directory next to the cache and renamed into place, so concurrent
//! processes either see a complete entry or none.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::ComponentName;
use crate::sources::SourceError;
use crate::util::fs::{dir_size, ensure_dir, remove_dir_all_if_exists};
use crate::util::hash::sha256_dir;

/// Length of the content-key prefix in entry directory names.
const KEY_PREFIX_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct ComponentCache {
    root: PathBuf,
}

impl ComponentCache {
    pub fn new(root: PathBuf) -> Self {
        ComponentCache { root }
    }

    /// The per-user default cache location.
    pub fn default_root() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "wharf")
            .context("cannot determine a cache directory for this platform")?;
        Ok(dirs.cache_dir().join("components"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name for one cache entry.
    ///
    /// `key` is the content identity: a component hash when the source has
    /// one, otherwise the version string.
    pub fn entry_name(name: &ComponentName, key: &str) -> String {
        let mut key: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect();
        key.truncate(KEY_PREFIX_LEN);
        format!("{}_{key}", name.dir_name())
    }

    pub fn entry_path(&self, name: &ComponentName, key: &str) -> PathBuf {
        self.root.join(Self::entry_name(name, key))
    }

    /// Return the entry for `name`/`key`, populating it with `fetch` if it is
    /// not present yet.
    ///
    /// A present entry is only reused after its content hash matches
    /// `expected_hash`; a tampered entry is an error, never silently served.
    /// `fetch` writes into a scratch directory that is renamed into place on
    /// success. If another process wins the rename race its entry is used and
    /// ours is discarded.
    pub fn ensure(
        &self,
        name: &ComponentName,
        key: &str,
        expected_hash: Option<&str>,
        fetch: impl FnOnce(&Path) -> Result<Option<String>, SourceError>,
    ) -> Result<PathBuf> {
        let entry = self.entry_path(name, key);
        if entry.is_dir() {
            if let Some(expected) = expected_hash {
                let actual = sha256_dir(&entry)?;
                if actual != expected {
                    return Err(SourceError::HashMismatch {
                        component: name.to_string(),
                        origin: format!("cache:{}", entry.display()),
                        expected: expected.to_string(),
                        actual,
                    }
                    .into());
                }
            }
            tracing::debug!(component = %name, entry = %entry.display(), "cache hit");
            return Ok(entry);
        }

        ensure_dir(&self.root)?;
        let scratch = tempfile::tempdir_in(&self.root)
            .with_context(|| format!("failed to create scratch dir in {}", self.root.display()))?;

        fetch(scratch.path())?;

        let staged = scratch.keep();
        match std::fs::rename(&staged, &entry) {
            Ok(()) => {}
            Err(_) if entry.is_dir() => {
                tracing::debug!(component = %name, "concurrent cache population, reusing");
                let _ = std::fs::remove_dir_all(&staged);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to publish cache entry {}", entry.display())
                });
            }
        }

        Ok(entry)
    }

    /// Delete entries not in `referenced` (entry directory names). Returns
    /// the number of entries removed.
    pub fn reclaim(&self, referenced: &BTreeSet<String>) -> Result<usize> {
        if !self.root.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read cache at {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            if !referenced.contains(&dir_name) {
                tracing::info!(entry = %dir_name, "reclaiming unreferenced cache entry");
                remove_dir_all_if_exists(&entry.path())?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Total size of the cache in bytes.
    pub fn size(&self) -> Result<u64> {
        if self.root.is_dir() {
            dir_size(&self.root)
        } else {
            Ok(0)
        }
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        remove_dir_all_if_exists(&self.root)
    }
}
