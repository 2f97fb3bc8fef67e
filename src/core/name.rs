//! Component names.
//!
//! A name is either a bare slug (`mag3110`) or a namespaced one
//! (`espressif/mag3110`). Identity is case-insensitive so that `Foo` and
//! `foo` share a cache entry and cannot both appear in one manifest.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slugs: letters, digits, `_`, `-`; no leading/trailing separators and no
/// separator runs.
pub static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\d]+(?:(?:[_-]|__)?[a-zA-Z\d]+)*$").unwrap()
});

#[derive(Debug, Error)]
#[error("invalid component name `{0}`: names are slugs of letters, digits, `_` and `-`, optionally prefixed with `namespace/`")]
pub struct InvalidName(String);

/// A validated component name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentName {
    // Stored lowercased; the namespace separator (if any) is kept inline.
    normalized: String,
}

impl ComponentName {
    /// Parse and validate a name, normalizing case.
    pub fn parse(input: &str) -> Result<Self, InvalidName> {
        let mut parts = input.splitn(2, '/');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();

        let valid = match second {
            Some(name) => SLUG_RE.is_match(first) && SLUG_RE.is_match(name),
            None => SLUG_RE.is_match(first),
        };

        if !valid {
            return Err(InvalidName(input.to_string()));
        }

        Ok(ComponentName {
            normalized: input.to_lowercase(),
        })
    }

    /// The normalized (lowercased) form.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// The namespace, if the name has one.
    pub fn namespace(&self) -> Option<&str> {
        self.normalized.split_once('/').map(|(ns, _)| ns)
    }

    /// The name without its namespace.
    pub fn short_name(&self) -> &str {
        match self.normalized.split_once('/') {
            Some((_, name)) => name,
            None => &self.normalized,
        }
    }

    /// Filesystem-safe form: the namespace separator becomes `__`.
    pub fn dir_name(&self) -> String {
        self.normalized.replace('/', "__")
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl FromStr for ComponentName {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentName::parse(s)
    }
}

impl Serialize for ComponentName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized)
    }
}

impl<'de> Deserialize<'de> for ComponentName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ComponentName::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        for name in ["asdf-fadsf", "123", "asdf_erw", "as_df_erw", "test-stse-sdf_sfd"] {
            assert!(ComponentName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_slugs() {
        for name in ["!", "asdf$f", "daf411~", "adf\nadsf", "_", "-", "_good", "asdf-_-fdsa-"] {
            assert!(ComponentName::parse(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_namespaced_names() {
        let name = ComponentName::parse("espressif/test_cmp").unwrap();
        assert_eq!(name.namespace(), Some("espressif"));
        assert_eq!(name.short_name(), "test_cmp");
        assert_eq!(name.dir_name(), "espressif__test_cmp");

        assert!(ComponentName::parse("a/b/c").is_err());
        assert!(ComponentName::parse("/name").is_err());
        assert!(ComponentName::parse("ns/").is_err());
    }

    #[test]
    fn test_case_insensitive_identity() {
        let a = ComponentName::parse("Espressif/Test_Cmp").unwrap();
        let b = ComponentName::parse("espressif/test_cmp").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "espressif/test_cmp");
    }

    #[test]
    fn test_bare_name() {
        let name = ComponentName::parse("idf").unwrap();
        assert_eq!(name.namespace(), None);
        assert_eq!(name.short_name(), "idf");
        assert_eq!(name.dir_name(), "idf");
    }
}
