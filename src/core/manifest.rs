//! Manifest parsing, schema validation and hashing.
//!
//! A component directory carries a `wharf.yml` describing its dependencies
//! and metadata. Loading validates the raw YAML against the fixed schema in
//! [`crate::core::schema`], collecting every problem found rather than
//! stopping at the first, and produces an immutable [`Manifest`]. The build
//! environment is threaded in explicitly: dependencies whose rules evaluate
//! false are excluded from the manifest entirely, which is also how the
//! environment is folded into the manifest hash.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use serde_json::json;
use serde_yaml::Value as Yaml;
use thiserror::Error;

use crate::core::env::{known_targets, BuildEnvironment};
use crate::core::name::ComponentName;
use crate::core::rules::Rule;
use crate::core::schema::{
    FULL_SLUG_RE, GIT_URL_RE, KNOWN_DEPENDENCY_KEYS, KNOWN_EXAMPLES_KEYS, KNOWN_FILES_KEYS,
    KNOWN_ROOT_KEYS, TAG_RE, URL_LINK_KEYS, URL_RE,
};
use crate::core::version::Constraint;
use crate::util::hash::sha256_bytes;

/// Canonical manifest filename inside a component directory.
pub const MANIFEST_FILENAME: &str = "wharf.yml";

/// Manifest parse or schema-validation failure.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse manifest {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{0}")]
    Validation(ValidationErrors),
}

/// Every problem found in one validation pass.
#[derive(Debug)]
pub struct ValidationErrors {
    pub manifest: String,
    pub errors: Vec<String>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "manifest `{}` has {} problem(s):",
            self.manifest,
            self.errors.len()
        )?;
        for error in &self.errors {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

/// How a dependency is exposed to dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    /// `require: no`. The dependency never participates in resolution.
    Excluded,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Excluded => "no",
        }
    }
}

/// Where a declared dependency comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// The toolchain builtin pseudo-component.
    Idf,
    /// The registry service; `None` means the default registry.
    Service { url: Option<String> },
    /// A git remote, optionally a subdirectory within the checkout.
    Git { url: String, path: Option<String> },
    /// A local directory; relative paths are resolved against the manifest dir.
    Local { path: PathBuf },
}

/// One rule of a dependency, kept with its source text for hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleClause {
    pub raw: String,
    pub rule: Rule,
}

/// A validated, normalized dependency declaration.
#[derive(Debug, Clone)]
pub struct DependencyDeclaration {
    pub name: ComponentName,
    pub constraint: Constraint,
    pub visibility: Visibility,
    pub source: DependencySource,
    pub rules: Vec<RuleClause>,
    pub include_prerelease: bool,
}

/// Descriptive metadata. None of it affects resolution or the manifest hash.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub description: Option<String>,
    pub maintainers: Vec<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub repository: Option<String>,
    pub documentation: Option<String>,
    pub issues: Option<String>,
    pub discussion: Option<String>,
}

/// File-inclusion globs from the `files` section.
#[derive(Debug, Clone, Default)]
pub struct FilePatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// A validated component manifest. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Manifest {
    name: String,
    version: Option<Version>,
    targets: Vec<String>,
    dependencies: BTreeMap<ComponentName, DependencyDeclaration>,
    files: FilePatterns,
    examples: Vec<String>,
    metadata: Metadata,
    manifest_dir: Option<PathBuf>,
}

impl Manifest {
    /// Build a manifest from a parsed YAML tree.
    ///
    /// `name` identifies the owning component in error messages and the
    /// solver. Dependencies whose rules evaluate false under `env` are
    /// dropped here and invisible to everything downstream.
    pub fn from_tree(
        tree: &Yaml,
        name: &str,
        manifest_dir: Option<&Path>,
        env: &BuildEnvironment,
    ) -> Result<Self, ManifestError> {
        let mut errors = Vec::new();
        let manifest = validate_normalize(tree, name, manifest_dir, env, &mut errors);

        if errors.is_empty() {
            Ok(manifest)
        } else {
            Err(ManifestError::Validation(ValidationErrors {
                manifest: name.to_string(),
                errors,
            }))
        }
    }

    /// Parse and validate manifest text. Empty input is an empty manifest.
    pub fn parse(
        content: &str,
        name: &str,
        manifest_dir: Option<&Path>,
        env: &BuildEnvironment,
    ) -> Result<Self, ManifestError> {
        let tree: Yaml = if content.trim().is_empty() {
            Yaml::Null
        } else {
            serde_yaml::from_str(content).map_err(|e| ManifestError::Parse {
                path: manifest_dir
                    .map(|d| d.join(MANIFEST_FILENAME))
                    .unwrap_or_else(|| PathBuf::from(MANIFEST_FILENAME)),
                message: e.to_string(),
            })?
        };
        Manifest::from_tree(&tree, name, manifest_dir, env)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Declared supported targets; empty means all targets.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Dependencies that survived rule filtering, keyed by normalized name.
    pub fn dependencies(&self) -> &BTreeMap<ComponentName, DependencyDeclaration> {
        &self.dependencies
    }

    pub fn files(&self) -> &FilePatterns {
        &self.files
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn manifest_dir(&self) -> Option<&Path> {
        self.manifest_dir.as_deref()
    }

    /// Stable digest of the resolution-relevant manifest content.
    ///
    /// Canonical key-sorted JSON of name, version, targets, files and the
    /// surviving dependency declarations. Descriptive metadata is excluded,
    /// as are dependencies removed by rule evaluation.
    pub fn manifest_hash(&self) -> String {
        let mut deps = serde_json::Map::new();
        for (name, dep) in &self.dependencies {
            let source = match &dep.source {
                DependencySource::Idf => json!({"type": "idf"}),
                DependencySource::Service { url } => json!({"type": "service", "url": url}),
                DependencySource::Git { url, path } => {
                    json!({"type": "git", "url": url, "path": path})
                }
                DependencySource::Local { path } => {
                    json!({"type": "local", "path": path.to_string_lossy()})
                }
            };
            let rules: Vec<&str> = dep.rules.iter().map(|r| r.raw.as_str()).collect();
            deps.insert(
                name.to_string(),
                json!({
                    "version": dep.constraint.as_str(),
                    "require": dep.visibility.as_str(),
                    "pre_release": dep.include_prerelease,
                    "rules": rules,
                    "source": source,
                }),
            );
        }

        let canonical = json!({
            "name": self.name,
            "version": self.version.as_ref().map(|v| v.to_string()),
            "targets": self.targets,
            "files": {
                "include": self.files.include,
                "exclude": self.files.exclude,
            },
            "dependencies": deps,
        });

        // serde_json::Map keeps keys sorted, so the byte form is canonical.
        sha256_bytes(canonical.to_string().as_bytes())
    }
}

/// Resolves component directories to their manifest files and loads them.
#[derive(Debug, Clone)]
pub struct ManifestManager {
    path: PathBuf,
    name: String,
}

impl ManifestManager {
    /// `path` may be the manifest file itself or the component directory.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        ManifestManager {
            path: path.into(),
            name: name.into(),
        }
    }

    /// The manifest file path, appending the canonical filename to directories.
    pub fn manifest_path(&self) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(MANIFEST_FILENAME)
        } else {
            self.path.clone()
        }
    }

    /// Load and validate the manifest. A missing file is an empty manifest.
    pub fn load(&self, env: &BuildEnvironment) -> Result<Manifest, ManifestError> {
        let path = self.manifest_path();
        let content = if path.exists() {
            std::fs::read_to_string(&path).map_err(|e| ManifestError::Io {
                path: path.clone(),
                source: e,
            })?
        } else {
            String::new()
        };

        Manifest::parse(&content, &self.name, path.parent(), env)
    }
}

/// The set of manifests one resolution covers.
#[derive(Debug, Clone)]
pub struct ProjectRequirements {
    manifests: Vec<Manifest>,
}

impl ProjectRequirements {
    pub fn new(manifests: Vec<Manifest>) -> Self {
        ProjectRequirements { manifests }
    }

    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }

    /// Digest of all manifest hashes, in manifest order.
    pub fn manifest_hash(&self) -> String {
        let mut combined = String::new();
        for manifest in &self.manifests {
            combined.push_str(&manifest.manifest_hash());
        }
        sha256_bytes(combined.as_bytes())
    }
}

fn validate_normalize(
    tree: &Yaml,
    name: &str,
    manifest_dir: Option<&Path>,
    env: &BuildEnvironment,
    errors: &mut Vec<String>,
) -> Manifest {
    let empty = serde_yaml::Mapping::new();
    let mapping = match tree {
        Yaml::Mapping(m) => m,
        Yaml::Null => &empty,
        _ => {
            errors.push("manifest must be a key/value mapping".to_string());
            &empty
        }
    };

    let mut unknown: Vec<String> = Vec::new();
    for key in mapping.keys() {
        match key.as_str() {
            Some(k) if KNOWN_ROOT_KEYS.contains(&k) => {}
            Some(k) => unknown.push(k.to_string()),
            None => errors.push("manifest keys must be strings".to_string()),
        }
    }
    if !unknown.is_empty() {
        unknown.sort();
        errors.push(format!("unknown keys: {}", unknown.join(", ")));
    }

    let version = mapping.get("version").and_then(|v| match v.as_str() {
        Some(s) => match Version::parse(s) {
            Ok(v) => Some(v),
            Err(_) => {
                errors.push(format!(
                    "component version should be a valid semantic version, got `{s}`"
                ));
                None
            }
        },
        None => {
            errors.push("`version` must be a string".to_string());
            None
        }
    });

    let targets = validate_targets(mapping.get("targets"), errors);
    let dependencies = validate_dependencies(mapping.get("dependencies"), manifest_dir, env, errors);
    let files = validate_files(mapping.get("files"), errors);
    let examples = validate_examples(mapping.get("examples"), errors);
    let metadata = validate_metadata(mapping, errors);

    Manifest {
        name: name.to_string(),
        version,
        targets,
        dependencies,
        files,
        examples,
        metadata,
        manifest_dir: manifest_dir.map(Path::to_path_buf),
    }
}

fn validate_targets(value: Option<&Yaml>, errors: &mut Vec<String>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    let Some(list) = value.as_sequence() else {
        errors.push("`targets` must be a list of target names".to_string());
        return Vec::new();
    };

    let known = known_targets();
    let mut targets = Vec::new();
    let mut unknown = Vec::new();
    for item in list {
        match item.as_str() {
            Some(t) if known.iter().any(|k| k == t) => targets.push(t.to_string()),
            Some(t) => unknown.push(t.to_string()),
            None => errors.push("`targets` entries must be strings".to_string()),
        }
    }
    if !unknown.is_empty() {
        errors.push(format!("unknown targets: {}", unknown.join(", ")));
    }

    targets
}

fn validate_dependencies(
    value: Option<&Yaml>,
    manifest_dir: Option<&Path>,
    env: &BuildEnvironment,
    errors: &mut Vec<String>,
) -> BTreeMap<ComponentName, DependencyDeclaration> {
    let mut result = BTreeMap::new();
    let Some(value) = value else {
        return result;
    };

    let Some(mapping) = value.as_mapping() else {
        errors.push("`dependencies` must be a mapping of component names".to_string());
        return result;
    };

    for (key, spec) in mapping {
        let Some(raw_name) = key.as_str() else {
            errors.push("dependency names must be strings".to_string());
            continue;
        };

        if !FULL_SLUG_RE.is_match(raw_name) {
            errors.push(format!(
                "component name is not valid: `{raw_name}`; names are slugs of letters, \
                 digits, `_` and `-`, optionally prefixed with `namespace/`"
            ));
            continue;
        }
        let name = match ComponentName::parse(raw_name) {
            Ok(n) => n,
            Err(e) => {
                errors.push(e.to_string());
                continue;
            }
        };

        if result.contains_key(&name) {
            errors.push(format!(
                "dependency `{name}` is declared more than once (names are case-insensitive)"
            ));
            continue;
        }

        if let Some(decl) = validate_dependency(&name, spec, manifest_dir, env, errors) {
            result.insert(name, decl);
        }
    }

    result
}

/// Validate one declaration; `None` means invalid or removed by its rules.
fn validate_dependency(
    name: &ComponentName,
    spec: &Yaml,
    manifest_dir: Option<&Path>,
    env: &BuildEnvironment,
    errors: &mut Vec<String>,
) -> Option<DependencyDeclaration> {
    // Shorthand `name: "1.2.3"` (or a bare `name:`) normalizes to the full
    // mapping shape before validation.
    let normalized;
    let mapping = match spec {
        Yaml::Null => {
            normalized = serde_yaml::Mapping::new();
            &normalized
        }
        Yaml::String(constraint) => {
            let mut m = serde_yaml::Mapping::new();
            m.insert(Yaml::from("version"), Yaml::from(constraint.as_str()));
            normalized = m;
            &normalized
        }
        Yaml::Mapping(m) => m,
        _ => {
            errors.push(format!(
                "dependency `{name}` must be a version string or a mapping"
            ));
            return None;
        }
    };

    let mut unknown: Vec<String> = Vec::new();
    for key in mapping.keys() {
        match key.as_str() {
            Some(k) if KNOWN_DEPENDENCY_KEYS.contains(&k) => {}
            Some(k) => unknown.push(k.to_string()),
            None => errors.push(format!("dependency `{name}`: keys must be strings")),
        }
    }
    if !unknown.is_empty() {
        unknown.sort();
        errors.push(format!(
            "unknown keys in dependency `{name}`: {}",
            unknown.join(", ")
        ));
    }

    let mut valid = true;

    let mut get_string = |key: &str, errors: &mut Vec<String>| -> Option<String> {
        match mapping.get(key) {
            None => None,
            Some(v) => match v.as_str() {
                Some(s) if !s.is_empty() => Some(s.to_string()),
                _ => {
                    errors.push(format!(
                        "dependency `{name}`: `{key}` must be a non-empty string"
                    ));
                    valid = false;
                    None
                }
            },
        }
    };

    let path = get_string("path", errors);
    let git = get_string("git", errors);
    let service_url = get_string("service_url", errors);
    let override_path = get_string("override_path", errors);

    let mut get_bool = |key: &str, errors: &mut Vec<String>| -> Option<bool> {
        match mapping.get(key) {
            None => None,
            Some(v) => match v.as_bool() {
                Some(b) => Some(b),
                None => {
                    errors.push(format!("dependency `{name}`: `{key}` must be a boolean"));
                    valid = false;
                    None
                }
            },
        }
    };

    let public = get_bool("public", errors);
    let include_prerelease = get_bool("pre_release", errors).unwrap_or(false);

    let constraint = match mapping.get("version") {
        None | Some(Yaml::Null) => Constraint::any(),
        Some(Yaml::String(s)) => match Constraint::parse(s) {
            Ok(c) => c,
            Err(e) => {
                errors.push(format!("version specification for `{name}` is invalid: {e}"));
                valid = false;
                Constraint::any()
            }
        },
        Some(_) => {
            errors.push(format!("dependency `{name}`: `version` must be a string"));
            valid = false;
            Constraint::any()
        }
    };

    let require = match mapping.get("require") {
        None => None,
        Some(Yaml::Bool(false)) => Some(Visibility::Excluded),
        Some(v) => match v.as_str() {
            Some("public") => Some(Visibility::Public),
            Some("private") => Some(Visibility::Private),
            Some("no") => Some(Visibility::Excluded),
            _ => {
                errors.push(format!(
                    "dependency `{name}`: `require` should be \"public\", \"private\" or \"no\""
                ));
                valid = false;
                None
            }
        },
    };

    let visibility = match (require, public) {
        (Some(v), _) => v,
        (None, Some(true)) => Visibility::Public,
        (None, _) => Visibility::Private,
    };

    // `override_path` beats every other source; `path` next to `git` names a
    // subdirectory of the checkout rather than a local source.
    let source = if let Some(p) = override_path.or_else(|| {
        if git.is_some() {
            None
        } else {
            path.clone()
        }
    }) {
        let mut full = PathBuf::from(&p);
        if full.is_relative() {
            if let Some(dir) = manifest_dir {
                full = dir.join(full);
            }
        }
        DependencySource::Local { path: full }
    } else if let Some(url) = git {
        if !GIT_URL_RE.is_match(&url) {
            errors.push(format!(
                "dependency `{name}`: `git` is not a valid git remote URL: `{url}`"
            ));
            valid = false;
        }
        DependencySource::Git { url, path }
    } else if name.as_str() == "idf" {
        DependencySource::Idf
    } else {
        DependencySource::Service { url: service_url }
    };

    let mut rules = Vec::new();
    match mapping.get("rules") {
        None => {}
        Some(Yaml::Sequence(items)) => {
            for item in items {
                let clause = item
                    .as_mapping()
                    .filter(|m| m.len() == 1)
                    .and_then(|m| m.get("if"))
                    .and_then(Yaml::as_str);
                match clause {
                    Some(expr) => match Rule::parse(expr) {
                        Ok(rule) => rules.push(RuleClause {
                            raw: expr.to_string(),
                            rule,
                        }),
                        Err(e) => {
                            errors.push(format!("dependency `{name}`: {e}"));
                            valid = false;
                        }
                    },
                    None => {
                        errors.push(format!(
                            "dependency `{name}`: each rule must be a mapping with a single `if` key"
                        ));
                        valid = false;
                    }
                }
            }
        }
        Some(_) => {
            errors.push(format!("dependency `{name}`: `rules` must be a list"));
            valid = false;
        }
    }

    if !valid {
        return None;
    }

    // A dependency whose rules fail is excluded entirely, not merely
    // unselected. A missing environment symbol is an error only here, at the
    // point a rule actually consumed it.
    for clause in &rules {
        match clause.rule.eval(env) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                errors.push(format!("dependency `{name}`: {e}"));
                return None;
            }
        }
    }

    Some(DependencyDeclaration {
        name: name.clone(),
        constraint,
        visibility,
        source,
        rules,
        include_prerelease,
    })
}

fn validate_files(value: Option<&Yaml>, errors: &mut Vec<String>) -> FilePatterns {
    let mut files = FilePatterns::default();
    let Some(value) = value else {
        return files;
    };

    let Some(mapping) = value.as_mapping() else {
        errors.push("`files` must be a mapping with `include`/`exclude` lists".to_string());
        return files;
    };

    let mut unknown: Vec<String> = Vec::new();
    for key in mapping.keys() {
        match key.as_str() {
            Some(k) if KNOWN_FILES_KEYS.contains(&k) => {}
            Some(k) => unknown.push(k.to_string()),
            None => errors.push("`files` keys must be strings".to_string()),
        }
    }
    if !unknown.is_empty() {
        unknown.sort();
        errors.push(format!("unknown keys in `files`: {}", unknown.join(", ")));
    }

    for key in KNOWN_FILES_KEYS {
        let Some(v) = mapping.get(*key) else {
            continue;
        };
        let mut patterns = Vec::new();
        match v.as_sequence() {
            Some(list) => {
                for item in list {
                    match item.as_str() {
                        Some(s) if !s.is_empty() => patterns.push(s.to_string()),
                        _ => errors
                            .push(format!("`files.{key}` entries must be non-empty strings")),
                    }
                }
            }
            None => errors.push(format!("`files.{key}` must be a list of patterns")),
        }
        match *key {
            "include" => files.include = patterns,
            _ => files.exclude = patterns,
        }
    }

    files
}

fn validate_examples(value: Option<&Yaml>, errors: &mut Vec<String>) -> Vec<String> {
    let mut examples = Vec::new();
    let Some(value) = value else {
        return examples;
    };

    let Some(list) = value.as_sequence() else {
        errors.push("`examples` must be a list of `{path: ...}` entries".to_string());
        return examples;
    };

    for item in list {
        let path = item
            .as_mapping()
            .filter(|m| {
                m.keys()
                    .all(|k| k.as_str().is_some_and(|k| KNOWN_EXAMPLES_KEYS.contains(&k)))
            })
            .and_then(|m| m.get("path"))
            .and_then(Yaml::as_str);
        match path {
            Some(p) if !p.is_empty() => examples.push(p.to_string()),
            _ => errors
                .push("each `examples` entry must be a mapping with a `path` key".to_string()),
        }
    }

    examples
}

fn validate_metadata(mapping: &serde_yaml::Mapping, errors: &mut Vec<String>) -> Metadata {
    let mut metadata = Metadata::default();

    if let Some(v) = mapping.get("description") {
        match v.as_str() {
            Some(s) if !s.is_empty() => metadata.description = Some(s.to_string()),
            _ => errors.push("`description` must be a non-empty string".to_string()),
        }
    }

    if let Some(v) = mapping.get("maintainers") {
        match v.as_sequence() {
            Some(list) => {
                for item in list {
                    match item.as_str() {
                        Some(s) if !s.is_empty() => metadata.maintainers.push(s.to_string()),
                        _ => errors
                            .push("`maintainers` entries must be non-empty strings".to_string()),
                    }
                }
            }
            None => errors.push("`maintainers` must be a list".to_string()),
        }
    }

    if let Some(v) = mapping.get("tags") {
        match v.as_sequence() {
            Some(list) => {
                let mut seen = BTreeSet::new();
                let mut duplicates = Vec::new();
                for item in list {
                    match item.as_str() {
                        Some(tag) if TAG_RE.is_match(tag) => {
                            if !seen.insert(tag.to_lowercase()) {
                                duplicates.push(tag.to_lowercase());
                            }
                            metadata.tags.push(tag.to_string());
                        }
                        Some(tag) => errors.push(format!(
                            "invalid tag `{tag}`: tags may be 3-32 symbols long and may \
                             contain letters, numbers, `_` and `-`"
                        )),
                        None => errors.push("`tags` entries must be strings".to_string()),
                    }
                }
                if !duplicates.is_empty() {
                    errors.push(format!(
                        "some tags appear more than once: {}",
                        duplicates.join(", ")
                    ));
                }
            }
            None => errors.push("`tags` must be a list".to_string()),
        }
    }

    for key in URL_LINK_KEYS {
        if let Some(v) = mapping.get(*key) {
            match v.as_str() {
                Some(s) if URL_RE.is_match(s) => {
                    let value = Some(s.to_string());
                    match *key {
                        "url" => metadata.url = value,
                        "documentation" => metadata.documentation = value,
                        "issues" => metadata.issues = value,
                        _ => metadata.discussion = value,
                    }
                }
                _ => errors.push(format!(
                    "invalid URL in the `{key}` field; check that the link is a correct \
                     HTTP(S) URL"
                )),
            }
        }
    }

    if let Some(v) = mapping.get("repository") {
        match v.as_str() {
            Some(s) if GIT_URL_RE.is_match(s) => metadata.repository = Some(s.to_string()),
            _ => errors.push(
                "invalid URL in the `repository` field; check that the link is a valid \
                 git remote URL"
                    .to_string(),
            ),
        }
    }

    metadata
}
