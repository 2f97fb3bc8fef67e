//! The fixed manifest schema.
//!
//! Key allow-lists and field regexes used by the validator, plus a
//! machine-readable JSON Schema derivation of the same shape (`wharf schema`).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

/// Recognized top-level manifest keys.
pub const KNOWN_ROOT_KEYS: &[&str] = &[
    "version",
    "targets",
    "maintainers",
    "description",
    "tags",
    "dependencies",
    "files",
    "examples",
    "url",
    "repository",
    "documentation",
    "issues",
    "discussion",
];

/// Recognized keys of a detailed dependency declaration.
pub const KNOWN_DEPENDENCY_KEYS: &[&str] = &[
    "version",
    "public",
    "path",
    "git",
    "service_url",
    "rules",
    "override_path",
    "require",
    "pre_release",
];

pub const KNOWN_FILES_KEYS: &[&str] = &["include", "exclude"];
pub const KNOWN_EXAMPLES_KEYS: &[&str] = &["path"];

/// Link fields validated as HTTP(S) URLs.
pub const URL_LINK_KEYS: &[&str] = &["url", "documentation", "issues", "discussion"];

const SLUG_PATTERN: &str = r"[a-zA-Z\d]+(?:(?:[_-]|__)?[a-zA-Z\d]+)*";
const TAG_PATTERN: &str = r"^[A-Za-z0-9_-]{3,32}$";
const URL_PATTERN: &str = r"^https?://[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,12}\b[-a-zA-Z0-9()@:%_\+.~#?&/=]*$";
const GIT_URL_PATTERN: &str =
    r"^((git|ssh|https?)://([\w\.\-@]+)(/[\w\.\-~/]+?)(\.git)?/?|git@[\w\.\-]+:[\w\.\-~/]+?(\.git)?)$";

/// Full dependency name: bare slug or `namespace/slug`.
pub static FULL_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{SLUG_PATTERN}(?:/{SLUG_PATTERN})?$")).unwrap()
});

/// Tags: 3-32 chars of letters, digits, `_` and `-`.
pub static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(TAG_PATTERN).unwrap());

/// Well-formed HTTP(S) URL.
pub static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(URL_PATTERN).unwrap());

/// Well-formed git remote, including the scp-like `git@host:user/repo` form.
pub static GIT_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(GIT_URL_PATTERN).unwrap());

/// The manifest shape as a JSON Schema document.
pub fn manifest_json_schema() -> Value {
    let nonempty_string = || json!({"type": "string", "minLength": 1});

    let dependency = json!({
        "anyOf": [
            {"type": "null"},
            {"type": "string"},
            {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "version": {"type": ["string", "null"]},
                    "public": {"type": "boolean"},
                    "path": nonempty_string(),
                    "git": nonempty_string(),
                    "service_url": nonempty_string(),
                    "rules": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": ["if"],
                            "properties": {"if": {"type": "string"}}
                        }
                    },
                    "override_path": nonempty_string(),
                    "require": {"type": "string", "enum": ["public", "private", "no"]},
                    "pre_release": {"type": "boolean"}
                }
            }
        ]
    });

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "wharf-manifest",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "version": {"type": "string"},
            "targets": {"type": "array", "items": {"type": "string"}},
            "maintainers": {"type": "array", "items": nonempty_string()},
            "description": nonempty_string(),
            "tags": {"type": "array", "items": {"type": "string", "pattern": TAG_PATTERN}},
            "dependencies": {
                "type": "object",
                "propertyNames": {"pattern": format!("^{SLUG_PATTERN}(?:/{SLUG_PATTERN})?$")},
                "additionalProperties": dependency
            },
            "files": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "include": {"type": "array", "items": nonempty_string()},
                    "exclude": {"type": "array", "items": nonempty_string()}
                }
            },
            "examples": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["path"],
                    "properties": {"path": nonempty_string()}
                }
            },
            "url": {"type": "string", "pattern": URL_PATTERN},
            "repository": {"type": "string", "pattern": GIT_URL_PATTERN},
            "documentation": {"type": "string", "pattern": URL_PATTERN},
            "issues": {"type": "string", "pattern": URL_PATTERN},
            "discussion": {"type": "string", "pattern": URL_PATTERN}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_git_urls() {
        for url in [
            "git://github.com/user/repo.git",
            "ssh://git@github.com/user/repo.git",
            "https://github.com/user/repo.git",
            "git://github.com/user/repo",
            "ssh://git@github.com/user/repo",
            "https://github.com/user/repo",
            "http://github.com/user/repo",
            "git@github.com:user/repo",
            "git@github.com:user/user.git",
        ] {
            assert!(GIT_URL_RE.is_match(url), "failed to match valid URL: {url}");
        }
    }

    #[test]
    fn test_invalid_git_urls() {
        for url in [
            "github.com/user/repo",
            "ftp://github.com/user/repo",
            "arstfpwafp",
            "WRj7vPcetd3!^Jun8r&WoSM9",
        ] {
            assert!(!GIT_URL_RE.is_match(url), "matched invalid URL: {url}");
        }
    }

    #[test]
    fn test_tag_pattern() {
        assert!(TAG_RE.is_match("dup_tag"));
        assert!(TAG_RE.is_match("a-long-but-reasonable-tag"));
        assert!(!TAG_RE.is_match("sm"));
        assert!(!TAG_RE.is_match("wrOng t@g"));
    }

    #[test]
    fn test_http_urls() {
        assert!(URL_RE.is_match("https://example.com/docs"));
        assert!(URL_RE.is_match("http://example.com"));
        assert!(!URL_RE.is_match("ftp://example.com"));
        assert!(!URL_RE.is_match("not a url"));
    }

    #[test]
    fn test_schema_shape() {
        let schema = manifest_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);

        let props = schema["properties"].as_object().unwrap();
        for key in KNOWN_ROOT_KEYS {
            assert!(props.contains_key(*key), "schema missing root key {key}");
        }

        let dep = &props["dependencies"]["additionalProperties"]["anyOf"][2];
        let dep_props = dep["properties"].as_object().unwrap();
        for key in KNOWN_DEPENDENCY_KEYS {
            assert!(dep_props.contains_key(*key), "schema missing dependency key {key}");
        }
    }
}
