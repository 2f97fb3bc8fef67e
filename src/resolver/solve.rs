//! The solver.
//!
//! Works over a queue of component names. For each name the constraints of
//! every requirer seen so far are intersected and the highest satisfying
//! version from the component's source is chosen; the chosen version's own
//! dependencies are then queued. A later requirement that the already-chosen
//! version cannot satisfy fails resolution outright, naming every
//! contributor.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::manifest::Visibility;
use crate::core::{
    BuildEnvironment, ComponentName, ComponentVersion, Constraint, DependencyDeclaration,
    ProjectRequirements,
};
use crate::resolver::errors::{Requirer, ResolveError, UnresolvableDependency};
use crate::sources::{ComponentSource, Source, VersionCandidate};

/// One resolved component as recorded in the lock file.
///
/// Fields are declared in alphabetical order so the serialized mapping keeps
/// sorted keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_hash: Option<String>,
    pub source: ComponentSource,
    pub version: ComponentVersion,
}

/// A complete resolution, keyed by normalized component name.
pub type Solution = BTreeMap<ComponentName, SolvedComponent>;

#[derive(Debug, Clone)]
struct Requirement {
    requirer: String,
    constraint: Constraint,
    include_prerelease: bool,
}

pub struct Resolver<'a> {
    env: &'a BuildEnvironment,
    sources: HashMap<String, Box<dyn Source>>,
}

impl<'a> Resolver<'a> {
    pub fn new(env: &'a BuildEnvironment) -> Self {
        Resolver {
            env,
            sources: HashMap::new(),
        }
    }

    /// Use `source` for everything identified by `id` instead of
    /// instantiating one on demand.
    pub fn register_source(&mut self, id: &ComponentSource, source: Box<dyn Source>) {
        self.sources.insert(id.cache_key(), source);
    }

    fn source_for(&mut self, id: &ComponentSource) -> &dyn Source {
        let env = self.env;
        &**self
            .sources
            .entry(id.cache_key())
            .or_insert_with(|| id.instantiate(env))
    }

    /// Resolve every dependency of `requirements` to an exact version.
    pub fn solve(&mut self, requirements: &ProjectRequirements) -> Result<Solution, ResolveError> {
        let mut queue: VecDeque<ComponentName> = VecDeque::new();
        let mut constraints: BTreeMap<ComponentName, Vec<Requirement>> = BTreeMap::new();
        let mut source_of: BTreeMap<ComponentName, ComponentSource> = BTreeMap::new();
        let mut solution: Solution = BTreeMap::new();

        fn add_requirement(
            requirer: String,
            decl: &DependencyDeclaration,
            queue: &mut VecDeque<ComponentName>,
            constraints: &mut BTreeMap<ComponentName, Vec<Requirement>>,
            source_of: &mut BTreeMap<ComponentName, ComponentSource>,
        ) {
            if decl.visibility == Visibility::Excluded {
                return;
            }
            constraints.entry(decl.name.clone()).or_default().push(Requirement {
                requirer,
                constraint: decl.constraint.clone(),
                include_prerelease: decl.include_prerelease,
            });
            // The first declared source wins; mismatching later
            // declarations keep their constraint but not their source.
            source_of
                .entry(decl.name.clone())
                .or_insert_with(|| ComponentSource::from_declaration(&decl.source));
            queue.push_back(decl.name.clone());
        }

        for manifest in requirements.manifests() {
            if let (false, Some(target)) = (manifest.targets().is_empty(), self.env.target()) {
                if !manifest.targets().iter().any(|t| t == target) {
                    return Err(ResolveError::UnsupportedTarget {
                        component: manifest.name().to_string(),
                        version: manifest
                            .version()
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| "*".to_string()),
                        target: target.to_string(),
                        supported: manifest.targets().to_vec(),
                    });
                }
            }

            for decl in manifest.dependencies().values() {
                add_requirement(
                    manifest.name().to_string(),
                    decl,
                    &mut queue,
                    &mut constraints,
                    &mut source_of,
                );
            }
        }

        while let Some(name) = queue.pop_front() {
            let requirements_for = constraints.get(&name).cloned().unwrap_or_default();

            // A component may be queued again by a later requirer; the chosen
            // version must satisfy the new constraint too.
            if let Some(solved) = solution.get(&name) {
                let include_pre = requirements_for.iter().any(|r| r.include_prerelease);
                if requirements_for
                    .iter()
                    .all(|r| r.constraint.matches_version(&solved.version, include_pre))
                {
                    continue;
                }
                return Err(ResolveError::Unresolvable(UnresolvableDependency {
                    component: name.to_string(),
                    requirers: to_requirers(&requirements_for),
                    available: vec![solved.version.to_string()],
                }));
            }

            let source_id = source_of
                .get(&name)
                .cloned()
                .unwrap_or(ComponentSource::Service {
                    url: crate::sources::DEFAULT_SERVICE_URL.to_string(),
                });
            let env = self.env;
            let source = self.source_for(&source_id);
            let mut candidates = source.versions(&name, env)?;

            // Versions for a foreign target are not candidates at all.
            if let Some(target) = env.target() {
                candidates
                    .retain(|c| c.targets.is_empty() || c.targets.iter().any(|t| t == target));
            }

            let include_pre = requirements_for.iter().any(|r| r.include_prerelease);
            let mut matching: Vec<&VersionCandidate> = candidates
                .iter()
                .filter(|c| {
                    requirements_for
                        .iter()
                        .all(|r| r.constraint.matches_version(&c.version, include_pre))
                })
                .collect();

            matching.sort_by(|a, b| compare_candidates(&a.version, &b.version));
            let Some(best) = matching.last().copied() else {
                return Err(ResolveError::Unresolvable(UnresolvableDependency {
                    component: name.to_string(),
                    requirers: to_requirers(&requirements_for),
                    available: candidates.iter().map(|c| c.version.to_string()).collect(),
                }));
            };

            tracing::debug!(component = %name, version = %best.version, "selected version");

            let requirer = format!("{name}@{}", best.version);
            for dep in &best.dependencies {
                add_requirement(
                    requirer.clone(),
                    dep,
                    &mut queue,
                    &mut constraints,
                    &mut source_of,
                );
            }

            solution.insert(
                name,
                SolvedComponent {
                    component_hash: best.component_hash.clone(),
                    source: source_id,
                    version: best.version.clone(),
                },
            );
        }

        Ok(solution)
    }
}

/// Order candidates for selection: semantic versions by precedence, and any
/// semantic version above revisions and unversioned candidates.
fn compare_candidates(a: &ComponentVersion, b: &ComponentVersion) -> Ordering {
    match (a, b) {
        (ComponentVersion::Semver(x), ComponentVersion::Semver(y)) => x.cmp(y),
        (ComponentVersion::Semver(_), _) => Ordering::Greater,
        (_, ComponentVersion::Semver(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn to_requirers(requirements: &[Requirement]) -> Vec<Requirer> {
    requirements
        .iter()
        .map(|r| Requirer {
            name: r.requirer.clone(),
            constraint: r.constraint.as_str().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use semver::Version;

    use crate::core::manifest::{DependencySource, Manifest};
    use crate::sources::{SourceError, DEFAULT_SERVICE_URL};

    fn env() -> BuildEnvironment {
        BuildEnvironment::new("esp32", Version::new(4, 4, 4))
    }

    fn name(s: &str) -> ComponentName {
        ComponentName::parse(s).unwrap()
    }

    /// An in-memory registry standing in for the service.
    struct FakeRegistry {
        components: BTreeMap<ComponentName, Vec<VersionCandidate>>,
    }

    impl FakeRegistry {
        fn new() -> Self {
            FakeRegistry {
                components: BTreeMap::new(),
            }
        }

        fn add(&mut self, component: &str, version: &str, hash: &str) -> &mut Self {
            self.add_full(component, version, hash, &[], &[])
        }

        fn add_full(
            &mut self,
            component: &str,
            version: &str,
            hash: &str,
            targets: &[&str],
            deps: &[(&str, &str)],
        ) -> &mut Self {
            let dependencies = deps
                .iter()
                .map(|(dep_name, spec)| DependencyDeclaration {
                    name: name(dep_name),
                    constraint: Constraint::parse(spec).unwrap(),
                    visibility: Visibility::Private,
                    source: DependencySource::Service { url: None },
                    rules: Vec::new(),
                    include_prerelease: false,
                })
                .collect();
            self.components
                .entry(name(component))
                .or_default()
                .push(VersionCandidate {
                    version: version.parse().unwrap(),
                    targets: targets.iter().map(|t| t.to_string()).collect(),
                    dependencies,
                    component_hash: Some(hash.to_string()),
                });
            self
        }
    }

    impl Source for FakeRegistry {
        fn name(&self) -> String {
            "fake-registry".to_string()
        }

        fn versions(
            &self,
            component: &ComponentName,
            _env: &BuildEnvironment,
        ) -> Result<Vec<VersionCandidate>, SourceError> {
            match self.components.get(component) {
                Some(candidates) => Ok(candidates.clone()),
                None => Err(SourceError::NotFound {
                    component: component.to_string(),
                    origin: self.name(),
                }),
            }
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

    fn solve_with(
        registry: FakeRegistry,
        manifest_yaml: &str,
    ) -> Result<Solution, ResolveError> {
        let env = env();
        let manifest = Manifest::parse(manifest_yaml, "main", None, &env).unwrap();
        let requirements = ProjectRequirements::new(vec![manifest]);

        let mut resolver = Resolver::new(&env);
        let service = ComponentSource::Service {
            url: DEFAULT_SERVICE_URL.to_string(),
        };
        resolver.register_source(&service, Box::new(registry));
        resolver.solve(&requirements)
    }

    #[test]
    fn test_picks_highest_satisfying_version() {
        let mut registry = FakeRegistry::new();
        registry
            .add("cmp", "1.0.0", "h1")
            .add("cmp", "1.2.0", "h2")
            .add("cmp", "2.0.0", "h3");

        let solution = solve_with(registry, "dependencies:\n  cmp: \"^1.0.0\"\n").unwrap();
        assert_eq!(solution[&name("cmp")].version.to_string(), "1.2.0");
        assert_eq!(
            solution[&name("cmp")].component_hash.as_deref(),
            Some("h2")
        );
    }

    #[test]
    fn test_idf_pinned_to_toolchain() {
        let solution =
            solve_with(FakeRegistry::new(), "dependencies:\n  idf: \">=4.4\"\n").unwrap();
        let idf = &solution[&name("idf")];
        assert_eq!(idf.version.to_string(), "4.4.4");
        assert_eq!(idf.source, ComponentSource::Idf);
        assert!(idf.component_hash.is_none());
    }

    #[test]
    fn test_idf_constraint_conflict() {
        let err =
            solve_with(FakeRegistry::new(), "dependencies:\n  idf: \">=5.0\"\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("idf"));
        assert!(message.contains(">=5.0"));
    }

    #[test]
    fn test_transitive_dependencies_resolved() {
        let mut registry = FakeRegistry::new();
        registry
            .add_full("app-lib", "1.0.0", "ha", &[], &[("leaf", ">=2.0.0")])
            .add("leaf", "1.9.0", "h1")
            .add("leaf", "2.3.0", "h2");

        let solution = solve_with(registry, "dependencies:\n  app-lib: \"*\"\n").unwrap();
        assert_eq!(solution.len(), 2);
        assert_eq!(solution[&name("leaf")].version.to_string(), "2.3.0");
    }

    #[test]
    fn test_conflicting_requirements_name_all_contributors() {
        let mut registry = FakeRegistry::new();
        registry
            .add_full("a", "1.0.0", "ha", &[], &[("leaf", "<2.0.0")])
            .add_full("b", "1.0.0", "hb", &[], &[("leaf", ">=2.0.0")])
            .add("leaf", "1.5.0", "h1")
            .add("leaf", "2.5.0", "h2");

        let err = solve_with(registry, "dependencies:\n  a: \"*\"\n  b: \"*\"\n").unwrap_err();
        let ResolveError::Unresolvable(inner) = err else {
            panic!("expected unresolvable, got {err:?}");
        };
        assert_eq!(inner.component, "leaf");
        assert!(inner.requirers.len() >= 2);
    }

    #[test]
    fn test_target_filtering() {
        let mut registry = FakeRegistry::new();
        registry
            .add_full("cmp", "2.0.0", "h2", &["esp32s2"], &[])
            .add_full("cmp", "1.0.0", "h1", &["esp32"], &[]);

        let solution = solve_with(registry, "dependencies:\n  cmp: \"*\"\n").unwrap();
        // 2.0.0 exists but not for this target.
        assert_eq!(solution[&name("cmp")].version.to_string(), "1.0.0");
    }

    #[test]
    fn test_root_manifest_target_mismatch() {
        let env = env();
        let manifest =
            Manifest::parse("targets: [esp32s2]\n", "main", None, &env).unwrap();
        let requirements = ProjectRequirements::new(vec![manifest]);

        let mut resolver = Resolver::new(&env);
        let err = resolver.solve(&requirements).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_prerelease_needs_opt_in() {
        let mut registry = FakeRegistry::new();
        registry.add("cmp", "1.0.0-rc1", "h1");

        let err = solve_with(registry, "dependencies:\n  cmp: \"*\"\n").unwrap_err();
        assert!(matches!(err, ResolveError::Unresolvable(_)));

        let mut registry = FakeRegistry::new();
        registry.add("cmp", "1.0.0-rc1", "h1");
        let solution = solve_with(
            registry,
            "dependencies:\n  cmp:\n    version: \"*\"\n    pre_release: true\n",
        )
        .unwrap();
        assert_eq!(solution[&name("cmp")].version.to_string(), "1.0.0-rc1");
    }

    #[test]
    fn test_empty_requirements_solve_to_empty_solution() {
        let env = env();
        let manifest = Manifest::parse("", "main", None, &env).unwrap();
        let requirements = ProjectRequirements::new(vec![manifest]);
        let mut resolver = Resolver::new(&env);
        assert!(resolver.solve(&requirements).unwrap().is_empty());
    }

    #[test]
    fn test_excluded_dependency_not_resolved() {
        let solution = solve_with(
            FakeRegistry::new(),
            "dependencies:\n  skipme:\n    version: \"1.0.0\"\n    require: \"no\"\n",
        )
        .unwrap();
        assert!(solution.is_empty());
    }
}
