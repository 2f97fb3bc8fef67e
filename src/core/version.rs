//! Component versions and the range-constraint language.
//!
//! A component version is either a semantic version, an opaque revision
//! identifier (a git commit id), or the wildcard `*`. Constraints are parsed
//! once into clause lists and matched against semantic versions.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static REVISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{7,40}$").unwrap());

/// Error parsing a version or constraint expression.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    #[error("invalid constraint `{input}`: bad clause `{clause}`")]
    InvalidConstraint { input: String, clause: String },

    #[error("unknown symbol `{0}` in rule expression")]
    UnknownSymbol(String),

    #[error("invalid rule expression `{0}`")]
    InvalidRule(String),
}

/// An exact version of a component.
///
/// Ordering is defined only between two semantic versions. Comparing a
/// revision or wildcard against anything else is simply "not equal".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentVersion {
    /// A full semantic version.
    Semver(Version),

    /// An opaque revision identifier, e.g. a git commit id.
    Revision(String),

    /// The wildcard `*`.
    Any,
}

impl ComponentVersion {
    /// Parse a version string.
    pub fn parse(s: &str) -> Result<Self, ConstraintError> {
        let s = s.trim();
        if s == "*" {
            return Ok(ComponentVersion::Any);
        }
        if let Ok(v) = Version::parse(s) {
            return Ok(ComponentVersion::Semver(v));
        }
        if REVISION_RE.is_match(s) {
            return Ok(ComponentVersion::Revision(s.to_string()));
        }
        Err(ConstraintError::InvalidVersion(s.to_string()))
    }

    pub fn is_semver(&self) -> bool {
        matches!(self, ComponentVersion::Semver(_))
    }

    pub fn is_revision(&self) -> bool {
        matches!(self, ComponentVersion::Revision(_))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ComponentVersion::Any)
    }

    /// The semantic version, if this is one.
    pub fn as_semver(&self) -> Option<&Version> {
        match self {
            ComponentVersion::Semver(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialOrd for ComponentVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (ComponentVersion::Semver(a), ComponentVersion::Semver(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentVersion::Semver(v) => write!(f, "{v}"),
            ComponentVersion::Revision(r) => write!(f, "{r}"),
            ComponentVersion::Any => write!(f, "*"),
        }
    }
}

impl FromStr for ComponentVersion {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentVersion::parse(s)
    }
}

impl Serialize for ComponentVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComponentVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ComponentVersion::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Comparison operator of a constraint clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exact,
    NotEqual,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Tilde,
    Caret,
    Wildcard,
}

/// One clause of a constraint, e.g. `>=1.2` or `~2.0.0`.
///
/// Missing minor/patch components widen the clause the way `1.2.*` would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    op: Op,
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Clause {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (op, rest) = if let Some(r) = text.strip_prefix(">=") {
            (Op::GreaterEq, r)
        } else if let Some(r) = text.strip_prefix("<=") {
            (Op::LessEq, r)
        } else if let Some(r) = text.strip_prefix("!=") {
            (Op::NotEqual, r)
        } else if let Some(r) = text.strip_prefix("==") {
            (Op::Exact, r)
        } else if let Some(r) = text.strip_prefix('=') {
            (Op::Exact, r)
        } else if let Some(r) = text.strip_prefix('>') {
            (Op::Greater, r)
        } else if let Some(r) = text.strip_prefix('<') {
            (Op::Less, r)
        } else if let Some(r) = text.strip_prefix('~') {
            (Op::Tilde, r)
        } else if let Some(r) = text.strip_prefix('^') {
            (Op::Caret, r)
        } else {
            (Op::Exact, text)
        };

        let rest = rest.trim();
        if rest == "*" {
            return match op {
                // A bare `*` only makes sense without an operator.
                Op::Exact => Some(Clause {
                    op: Op::Wildcard,
                    major: None,
                    minor: None,
                    patch: None,
                    pre: Prerelease::EMPTY,
                }),
                _ => None,
            };
        }

        // Split pre-release/build metadata off the numeric core.
        let (core, pre) = match rest.split_once('-') {
            Some((c, p)) => {
                let p = p.split('+').next().unwrap_or(p);
                (c, Prerelease::new(p).ok()?)
            }
            None => (rest.split('+').next().unwrap_or(rest), Prerelease::EMPTY),
        };

        let mut parts = core.split('.');
        let major = parts.next()?;
        let minor = parts.next();
        let patch = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let parse_part = |p: &str| -> Option<Option<u64>> {
            if p == "*" {
                Some(None)
            } else {
                p.parse::<u64>().ok().map(Some)
            }
        };

        let major = parse_part(major)?;
        let minor = match minor {
            Some(m) => parse_part(m)?,
            None => None,
        };
        let patch = match patch {
            Some(p) => parse_part(p)?,
            None => None,
        };

        // `1.*.3` is nonsense; components must widen right-to-left.
        if (major.is_none() && minor.is_some()) || (minor.is_none() && patch.is_some()) {
            return None;
        }
        if !pre.is_empty() && patch.is_none() {
            return None;
        }

        let op = if major.is_none() { Op::Wildcard } else { op };
        Some(Clause {
            op,
            major,
            minor,
            patch,
            pre,
        })
    }

    fn lower(&self) -> Version {
        let mut v = Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        );
        v.pre = self.pre.clone();
        v
    }

    fn matches(&self, v: &Version) -> bool {
        let lower = self.lower();
        match self.op {
            Op::Exact | Op::NotEqual => {
                let eq = match (self.major, self.minor, self.patch) {
                    (Some(_), Some(_), Some(_)) => *v == lower,
                    (Some(ma), Some(mi), None) => v.major == ma && v.minor == mi,
                    (Some(ma), None, None) => v.major == ma,
                    _ => true,
                };
                if self.op == Op::Exact {
                    eq
                } else {
                    !eq
                }
            }
            Op::Greater => *v > lower,
            Op::GreaterEq => *v >= lower,
            Op::Less => *v < lower,
            Op::LessEq => *v <= lower,
            Op::Tilde => {
                // ~1.2.3 and ~1.2 allow patch-level changes, ~1 minor-level.
                let upper = if self.minor.is_some() {
                    Version::new(lower.major, lower.minor + 1, 0)
                } else {
                    Version::new(lower.major + 1, 0, 0)
                };
                *v >= lower && version_below(v, &upper)
            }
            Op::Caret => {
                // Left-most non-zero component stays fixed.
                let upper = if lower.major > 0 {
                    Version::new(lower.major + 1, 0, 0)
                } else if lower.minor > 0 {
                    Version::new(0, lower.minor + 1, 0)
                } else {
                    Version::new(0, 0, lower.patch + 1)
                };
                *v >= lower && version_below(v, &upper)
            }
            Op::Wildcard => match (self.major, self.minor) {
                (None, _) => true,
                (Some(ma), None) => v.major == ma,
                (Some(ma), Some(mi)) => v.major == ma && v.minor == mi,
            },
        }
    }
}

/// `v < upper`, not admitting pre-releases of `upper` itself.
fn version_below(v: &Version, upper: &Version) -> bool {
    if v.major == upper.major && v.minor == upper.minor && v.patch == upper.patch {
        return false;
    }
    *v < *upper
}

/// A parsed range constraint over semantic versions.
///
/// `||` separates alternatives; within an alternative, comma-separated
/// clauses must all hold. A version satisfies the constraint iff it satisfies
/// every clause of at least one alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    groups: Vec<Vec<Clause>>,
    raw: String,
}

impl Constraint {
    /// The constraint matching every version, `*`.
    pub fn any() -> Self {
        Constraint {
            groups: vec![vec![Clause {
                op: Op::Wildcard,
                major: None,
                minor: None,
                patch: None,
                pre: Prerelease::EMPTY,
            }]],
            raw: "*".to_string(),
        }
    }

    /// Parse a constraint expression.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Constraint::any());
        }

        let mut groups = Vec::new();
        for group in trimmed.split("||") {
            let mut clauses = Vec::new();
            for clause in group.split(',') {
                let parsed =
                    Clause::parse(clause).ok_or_else(|| ConstraintError::InvalidConstraint {
                        input: trimmed.to_string(),
                        clause: clause.trim().to_string(),
                    })?;
                clauses.push(parsed);
            }
            groups.push(clauses);
        }

        Ok(Constraint {
            groups,
            raw: trimmed.to_string(),
        })
    }

    /// True when this constraint is the bare wildcard.
    pub fn is_any(&self) -> bool {
        self.groups.len() == 1
            && self.groups[0].len() == 1
            && self.groups[0][0].op == Op::Wildcard
            && self.groups[0][0].major.is_none()
    }

    /// Check a semantic version against the constraint.
    ///
    /// Pre-release versions never match unless the caller opted in.
    pub fn matches(&self, v: &Version, include_prerelease: bool) -> bool {
        if !v.pre.is_empty() && !include_prerelease {
            return false;
        }
        self.groups
            .iter()
            .any(|group| group.iter().all(|c| c.matches(v)))
    }

    /// Check a component version. Revisions only satisfy the wildcard.
    pub fn matches_version(&self, v: &ComponentVersion, include_prerelease: bool) -> bool {
        match v {
            ComponentVersion::Semver(v) => self.matches(v, include_prerelease),
            ComponentVersion::Revision(_) | ComponentVersion::Any => self.is_any(),
        }
    }

    /// The original constraint text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::parse(s)
    }
}

impl Serialize for Constraint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Constraint::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a version string, filling in missing components with zeros.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_component_version_tags() {
        let semver = ComponentVersion::parse("1.2.3").unwrap();
        assert!(semver.is_semver());
        assert!(!semver.is_revision());
        assert!(!semver.is_any());

        let any = ComponentVersion::parse("*").unwrap();
        assert!(any.is_any());

        let rev = ComponentVersion::parse("699d3202533d13b55df3021d93352d8c242ee81e").unwrap();
        assert!(rev.is_revision());

        assert!(ComponentVersion::parse("1!.3.3").is_err());
    }

    #[test]
    fn test_component_version_equality() {
        let a = ComponentVersion::parse("3.0.4").unwrap();
        assert_eq!(a, ComponentVersion::parse("3.0.4").unwrap());
        assert_ne!(a, ComponentVersion::parse("*").unwrap());
        assert_ne!(
            a,
            ComponentVersion::parse("699d3202533d13b55df3021d93352d8c242ee81e").unwrap()
        );
    }

    #[test]
    fn test_component_version_ordering() {
        let a = ComponentVersion::parse("3.0.4").unwrap();
        let b = ComponentVersion::parse("3.0.6").unwrap();
        assert!(a < b);

        let rev = ComponentVersion::parse("699d3202533d13b55df3021d93352d8c242ee81e").unwrap();
        assert_eq!(a.partial_cmp(&rev), None);
    }

    #[test]
    fn test_exact_constraint() {
        let c = Constraint::parse("1.2.7").unwrap();
        assert!(c.matches(&v("1.2.7"), false));
        assert!(!c.matches(&v("1.2.8"), false));
    }

    #[test]
    fn test_comparison_constraints() {
        let c = Constraint::parse(">=1.0.0,<2.0.0").unwrap();
        assert!(c.matches(&v("1.0.0"), false));
        assert!(c.matches(&v("1.9.9"), false));
        assert!(!c.matches(&v("2.0.0"), false));
        assert!(!c.matches(&v("0.9.9"), false));

        let ge = Constraint::parse(">=2.0.0").unwrap();
        assert!(ge.matches(&v("2.0.0"), false));
        assert!(ge.matches(&v("3.0.0"), false));
        assert!(!ge.matches(&v("1.9.9"), false));
    }

    #[test]
    fn test_not_equal() {
        let c = Constraint::parse("!=1.2.3").unwrap();
        assert!(!c.matches(&v("1.2.3"), false));
        assert!(c.matches(&v("1.2.4"), false));
    }

    #[test]
    fn test_caret_constraint() {
        let c = Constraint::parse("^1.2.3").unwrap();
        assert!(c.matches(&v("1.2.3"), false));
        assert!(c.matches(&v("1.9.0"), false));
        assert!(!c.matches(&v("2.0.0"), false));
        assert!(!c.matches(&v("1.2.2"), false));

        let zero = Constraint::parse("^0.2.3").unwrap();
        assert!(zero.matches(&v("0.2.9"), false));
        assert!(!zero.matches(&v("0.3.0"), false));
    }

    #[test]
    fn test_tilde_constraint() {
        let c = Constraint::parse("~1.2.3").unwrap();
        assert!(c.matches(&v("1.2.3"), false));
        assert!(c.matches(&v("1.2.9"), false));
        assert!(!c.matches(&v("1.3.0"), false));

        let major_only = Constraint::parse("~1").unwrap();
        assert!(major_only.matches(&v("1.9.0"), false));
        assert!(!major_only.matches(&v("2.0.0"), false));
    }

    #[test]
    fn test_wildcard_constraint() {
        let star = Constraint::parse("*").unwrap();
        assert!(star.is_any());
        assert!(star.matches(&v("0.0.1"), false));
        assert!(star.matches(&v("99.0.0"), false));

        let minor = Constraint::parse("1.2.*").unwrap();
        assert!(minor.matches(&v("1.2.0"), false));
        assert!(!minor.matches(&v("1.3.0"), false));
    }

    #[test]
    fn test_or_groups() {
        let c = Constraint::parse(">=1.0.0,<2.0.0||>=3.0.0").unwrap();
        assert!(c.matches(&v("1.5.0"), false));
        assert!(!c.matches(&v("2.5.0"), false));
        assert!(c.matches(&v("3.1.0"), false));
    }

    #[test]
    fn test_partial_versions() {
        let c = Constraint::parse(">=5").unwrap();
        assert!(c.matches(&v("5.0.0"), false));
        assert!(c.matches(&v("6.1.0"), false));
        assert!(!c.matches(&v("4.9.9"), false));
    }

    #[test]
    fn test_prerelease_opt_in() {
        let c = Constraint::parse(">=1.0.0").unwrap();
        assert!(!c.matches(&v("2.0.0-rc1"), false));
        assert!(c.matches(&v("2.0.0-rc1"), true));
        assert!(c.matches(&v("2.0.0"), false));
    }

    #[test]
    fn test_ordered_boundary() {
        // a < b < c: >=b matches b and c but not a.
        let (a, b, c) = (v("1.0.0"), v("1.5.0"), v("2.0.0"));
        let ge = Constraint::parse(">=1.5.0").unwrap();
        assert!(!ge.matches(&a, false));
        assert!(ge.matches(&b, false));
        assert!(ge.matches(&c, false));

        let exact = Constraint::parse("1.5.0").unwrap();
        assert!(exact.matches(&b, false));
        assert!(!exact.matches(&a, false));
        assert!(!exact.matches(&c, false));
    }

    #[test]
    fn test_invalid_constraint_names_clause() {
        let err = Constraint::parse(">=1.0.0,bogus^^2").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bogus^^2"));
    }

    #[test]
    fn test_revision_only_matches_star() {
        let rev = ComponentVersion::parse("699d3202533d13b55df3021d93352d8c242ee81e").unwrap();
        assert!(Constraint::any().matches_version(&rev, false));
        assert!(!Constraint::parse(">=1.0.0")
            .unwrap()
            .matches_version(&rev, false));
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version_lenient("5"), Some(Version::new(5, 0, 0)));
        assert_eq!(parse_version_lenient("1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_version_lenient("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version_lenient("x.y"), None);
    }
}
