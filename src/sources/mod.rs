//! Component sources.
//!
//! A source knows how to list available versions of a component and how to
//! materialize one version into a directory. Four kinds exist: the toolchain
//! builtin, local directories, git remotes, and the registry service. The
//! resolver only sees the [`Source`] trait; the lock file records the
//! serialized [`ComponentSource`] form.

mod cache;
mod git;
mod idf;
mod local;
mod service;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::manifest::DependencySource;
use crate::core::{BuildEnvironment, ComponentName, ComponentVersion, DependencyDeclaration};

pub use cache::ComponentCache;
pub use git::GitSource;
pub use idf::IdfSource;
pub use local::LocalSource;
pub use service::{ServiceSource, DEFAULT_SERVICE_URL};

/// Failure talking to or materializing from a source.
///
/// The offending source is carried as its display name (`origin`), not as a
/// nested error.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source `{origin}` is unavailable: {reason}")]
    Unavailable { origin: String, reason: String },

    #[error(
        "checksum mismatch for `{component}` from `{origin}`: expected {expected}, got {actual}"
    )]
    HashMismatch {
        component: String,
        origin: String,
        expected: String,
        actual: String,
    },

    #[error("component `{component}` not found in `{origin}`")]
    NotFound { component: String, origin: String },

    #[error("manifest of `{component}` from `{origin}` is invalid: {message}")]
    InvalidManifest {
        component: String,
        origin: String,
        message: String,
    },
}

/// One version a source can provide, with the metadata the solver needs.
#[derive(Debug, Clone)]
pub struct VersionCandidate {
    pub version: ComponentVersion,
    /// Targets this version supports; empty means all.
    pub targets: Vec<String>,
    /// The version's own (rule-filtered) dependency declarations.
    pub dependencies: Vec<DependencyDeclaration>,
    /// Content hash, for sources that can compute one ahead of download.
    pub component_hash: Option<String>,
}

/// A provider of component versions.
pub trait Source {
    /// Identifier used in logs and error messages.
    fn name(&self) -> String;

    /// Versions available for `name`, in no particular order.
    fn versions(
        &self,
        name: &ComponentName,
        env: &BuildEnvironment,
    ) -> Result<Vec<VersionCandidate>, SourceError>;

    /// Materialize one version of `name` into `dest`. Returns the content
    /// hash when the source has one.
    fn fetch(
        &self,
        name: &ComponentName,
        version: &ComponentVersion,
        dest: &Path,
    ) -> Result<Option<String>, SourceError>;
}

/// The serialized identity of a source, as stored in lock files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentSource {
    Idf,
    Local { path: PathBuf },
    Git { url: String, path: Option<String> },
    Service { url: String },
}

impl ComponentSource {
    /// Instantiate the matching [`Source`] implementation.
    pub fn instantiate(&self, env: &BuildEnvironment) -> Box<dyn Source> {
        match self {
            ComponentSource::Idf => Box::new(IdfSource::new(env.idf_version().cloned())),
            ComponentSource::Local { path } => Box::new(LocalSource::new(path.clone())),
            ComponentSource::Git { url, path } => {
                Box::new(GitSource::new(url.clone(), path.clone()))
            }
            ComponentSource::Service { url } => Box::new(ServiceSource::new(url.clone())),
        }
    }

    /// The source a manifest declaration names.
    pub fn from_declaration(decl: &DependencySource) -> Self {
        match decl {
            DependencySource::Idf => ComponentSource::Idf,
            DependencySource::Local { path } => ComponentSource::Local { path: path.clone() },
            DependencySource::Git { url, path } => ComponentSource::Git {
                url: url.clone(),
                path: path.clone(),
            },
            DependencySource::Service { url } => ComponentSource::Service {
                url: url.clone().unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            },
        }
    }

    /// Stable string identity, used for deduplication and cache keys.
    pub fn cache_key(&self) -> String {
        match self {
            ComponentSource::Idf => "idf".to_string(),
            ComponentSource::Local { path } => format!("local:{}", path.display()),
            ComponentSource::Git { url, path } => match path {
                Some(p) => format!("git:{url}:{p}"),
                None => format!("git:{url}"),
            },
            ComponentSource::Service { url } => format!("service:{url}"),
        }
    }
}

// Field names are declared in alphabetical order so the emitted YAML mapping
// keeps sorted keys, matching the canonical lock format.
#[derive(Serialize, Deserialize)]
struct RawSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    git: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_url: Option<String>,
    #[serde(rename = "type")]
    kind: String,
}

impl Serialize for ComponentSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            ComponentSource::Idf => RawSource {
                git: None,
                path: None,
                service_url: None,
                kind: "idf".to_string(),
            },
            ComponentSource::Local { path } => RawSource {
                git: None,
                path: Some(path.to_string_lossy().into_owned()),
                service_url: None,
                kind: "local".to_string(),
            },
            ComponentSource::Git { url, path } => RawSource {
                git: Some(url.clone()),
                path: path.clone(),
                service_url: None,
                kind: "git".to_string(),
            },
            ComponentSource::Service { url } => RawSource {
                git: None,
                path: None,
                service_url: Some(url.clone()),
                kind: "service".to_string(),
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ComponentSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSource::deserialize(deserializer)?;
        match raw.kind.as_str() {
            "idf" => Ok(ComponentSource::Idf),
            "local" => {
                let path = raw
                    .path
                    .ok_or_else(|| serde::de::Error::missing_field("path"))?;
                Ok(ComponentSource::Local {
                    path: PathBuf::from(path),
                })
            }
            "git" => {
                let url = raw
                    .git
                    .ok_or_else(|| serde::de::Error::missing_field("git"))?;
                Ok(ComponentSource::Git {
                    url,
                    path: raw.path,
                })
            }
            "service" => {
                let url = raw
                    .service_url
                    .ok_or_else(|| serde::de::Error::missing_field("service_url"))?;
                Ok(ComponentSource::Service { url })
            }
            other => Err(serde::de::Error::custom(format!(
                "unknown source type `{other}`"
            ))),
        }
    }
}
