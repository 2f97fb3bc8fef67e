//! Registry service source.
//!
//! Talks to the component registry over HTTP. Version listings come from the
//! component metadata endpoint and carry everything the solver needs, so
//! nothing is downloaded until fetch time. Downloads are gzipped tarballs
//! verified against the registry-reported content hash.

use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use serde::Deserialize;
use tar::Archive;

use crate::core::manifest::{DependencySource, Visibility};
use crate::core::{
    BuildEnvironment, ComponentName, ComponentVersion, Constraint, DependencyDeclaration,
};
use crate::sources::{Source, SourceError, VersionCandidate};
use crate::util::hash::sha256_dir;

/// The default registry.
pub const DEFAULT_SERVICE_URL: &str = "https://components.espressif.com/api";

/// Namespace assumed for bare component names.
const DEFAULT_NAMESPACE: &str = "espressif";

pub struct ServiceSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct ApiComponent {
    versions: Vec<ApiVersion>,
}

#[derive(Debug, Deserialize)]
struct ApiVersion {
    version: String,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    dependencies: Vec<ApiDependency>,
    url: String,
    #[serde(default)]
    component_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDependency {
    #[serde(default)]
    namespace: Option<String>,
    name: String,
    #[serde(default = "any_spec")]
    spec: String,
}

fn any_spec() -> String {
    "*".to_string()
}

/// Find the registry entry whose version string parses to `version`.
/// Entries with unparseable versions never match.
fn find_version<'a>(
    component: &'a ApiComponent,
    version: &ComponentVersion,
) -> Option<&'a ApiVersion> {
    component
        .versions
        .iter()
        .find(|v| v.version.parse::<ComponentVersion>().ok().as_ref() == Some(version))
}

impl ServiceSource {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        ServiceSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn unavailable(&self, reason: impl ToString) -> SourceError {
        SourceError::Unavailable {
            origin: self.name(),
            reason: reason.to_string(),
        }
    }

    fn component_url(&self, name: &ComponentName) -> String {
        let namespace = name.namespace().unwrap_or(DEFAULT_NAMESPACE);
        format!(
            "{}/components/{}/{}",
            self.base_url,
            namespace,
            name.short_name()
        )
    }

    fn get_component(&self, name: &ComponentName) -> Result<ApiComponent, SourceError> {
        let url = self.component_url(name);
        tracing::debug!(%url, "querying registry");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.unavailable(e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound {
                component: name.to_string(),
                origin: self.name(),
            });
        }
        let response = response
            .error_for_status()
            .map_err(|e| self.unavailable(e))?;

        response
            .json::<ApiComponent>()
            .map_err(|e| self.unavailable(format!("malformed registry response: {e}")))
    }

    /// Convert a registry dependency record to a declaration on this service.
    fn convert_dependency(&self, dep: &ApiDependency) -> Option<DependencyDeclaration> {
        let full_name = match &dep.namespace {
            Some(ns) => format!("{ns}/{}", dep.name),
            None => dep.name.clone(),
        };
        let name = ComponentName::parse(&full_name).ok()?;
        let constraint = Constraint::parse(&dep.spec).ok()?;

        Some(DependencyDeclaration {
            name,
            constraint,
            visibility: Visibility::Private,
            source: DependencySource::Service {
                url: Some(self.base_url.clone()),
            },
            rules: Vec::new(),
            include_prerelease: false,
        })
    }
}

impl Source for ServiceSource {
    fn name(&self) -> String {
        format!("service:{}", self.base_url)
    }

    fn versions(
        &self,
        name: &ComponentName,
        _env: &BuildEnvironment,
    ) -> Result<Vec<VersionCandidate>, SourceError> {
        let component = self.get_component(name)?;

        let mut candidates = Vec::new();
        for entry in &component.versions {
            let Ok(version) = entry.version.parse::<ComponentVersion>() else {
                tracing::warn!(
                    component = %name,
                    version = %entry.version,
                    "skipping unparseable registry version"
                );
                continue;
            };
            let dependencies = entry
                .dependencies
                .iter()
                .filter_map(|d| self.convert_dependency(d))
                .collect();
            candidates.push(VersionCandidate {
                version,
                targets: entry.targets.clone(),
                dependencies,
                component_hash: entry.component_hash.clone(),
            });
        }

        Ok(candidates)
    }

    fn fetch(
        &self,
        name: &ComponentName,
        version: &ComponentVersion,
        dest: &Path,
    ) -> Result<Option<String>, SourceError> {
        let component = self.get_component(name)?;
        let entry = find_version(&component, version)
            .ok_or_else(|| SourceError::NotFound {
                component: format!("{name}@{version}"),
                origin: self.name(),
            })?;

        tracing::info!(component = %name, %version, "downloading component archive");
        let response = self
            .client
            .get(&entry.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.unavailable(e))?;

        let mut archive = Archive::new(GzDecoder::new(response));
        archive
            .unpack(dest)
            .map_err(|e| self.unavailable(format!("failed to unpack archive: {e}")))?;

        let actual = sha256_dir(dest).map_err(|e| self.unavailable(e))?;
        if let Some(expected) = &entry.component_hash {
            if expected != &actual {
                return Err(SourceError::HashMismatch {
                    component: format!("{name}@{version}"),
                    origin: self.name(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        Ok(Some(actual))
    }
}
