//! Declarative policy documents.
//!
//! A [`PolicyDocument`] describes a [`SequentialPolicy`] as data: two
//! default conclusions and two rule lists, deserializable from JSON.
//! Omitted defaults deserialize to deny, so a half-written document fails
//! closed rather than open.
//!
//! Documents load from a single file with [`PolicyDocument::load`], or
//! from an ordered stack of files with [`PolicyDocument::load_layered`],
//! where later files take per-field precedence.
//!
//! ## Example
//!
//! ```rust
//! use loadgate::{LoadPolicy, PolicyDocument};
//!
//! let document = PolicyDocument::from_json_str(r#"{
//!     "class_default": "deny",
//!     "class_rules": [
//!         { "pattern": "java\\.lang\\..*", "conclusion": "allow", "quick": true }
//!     ]
//! }"#)?;
//!
//! let policy = document.compile()?;
//! assert!(policy.allows_class("java.lang.Object"));
//! assert!(!policy.allows_class("sun.misc.Unsafe"));
//! # Ok::<(), loadgate::ConfigError>(())
//! ```

use std::fs;
use std::path::Path;

use figment::Figment;
use figment::providers::{Format, Json};
use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::error::ConfigError;
use crate::policy::SequentialPolicy;
use crate::rule::Conclusion;

/// A declarative description of a sequential policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Default conclusion for class requests. Deny when omitted.
    #[serde(default = "PolicyDocument::default_conclusion")]
    pub class_default: Conclusion,

    /// Default conclusion for resource requests. Deny when omitted.
    #[serde(default = "PolicyDocument::default_conclusion")]
    pub resource_default: Conclusion,

    /// Class rules, in evaluation order.
    #[serde(default)]
    pub class_rules: Vec<RuleDef>,

    /// Resource rules, in evaluation order.
    #[serde(default)]
    pub resource_rules: Vec<RuleDef>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            class_default: Self::default_conclusion(),
            resource_default: Self::default_conclusion(),
            class_rules: Vec::new(),
            resource_rules: Vec::new(),
        }
    }
}

/// One rule in a policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    /// The whole-string pattern to match names against.
    pub pattern: String,

    /// The conclusion a match produces.
    pub conclusion: Conclusion,

    /// Whether a match ends evaluation immediately. False when omitted.
    #[serde(default)]
    pub quick: bool,
}

impl PolicyDocument {
    fn default_conclusion() -> Conclusion {
        Conclusion::Deny
    }

    /// Parses a document from a JSON string.
    #[instrument(level = Level::TRACE, skip(json))]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a document from a single JSON file.
    #[instrument(level = Level::TRACE, skip(path))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Loads a document by merging JSON files in order.
    ///
    /// Later files take per-field precedence: a file that sets
    /// `class_rules` replaces the earlier list wholesale rather than
    /// appending to it. Fields no file sets fall back to the serde
    /// defaults (deny, empty chains).
    #[instrument(level = Level::TRACE, skip(paths))]
    pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        for path in paths {
            figment = figment.merge(Json::file(path.as_ref()));
        }
        Ok(figment.extract()?)
    }

    /// Compiles the document into an immutable [`SequentialPolicy`].
    ///
    /// The first rule with a malformed pattern aborts compilation with
    /// [`ConfigError::InvalidPattern`].
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn compile(&self) -> Result<SequentialPolicy, ConfigError> {
        let mut builder = SequentialPolicy::builder(self.class_default, self.resource_default);

        for rule in &self.class_rules {
            builder.add_class_rule(&rule.pattern, rule.conclusion, rule.quick)?;
        }
        for rule in &self.resource_rules {
            builder.add_resource_rule(&rule.pattern, rule.conclusion, rule.quick)?;
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::policy::LoadPolicy;

    #[test]
    fn test_empty_document_fails_closed() {
        let document = PolicyDocument::from_json_str("{}").unwrap();
        assert_eq!(document.class_default, Conclusion::Deny);
        assert_eq!(document.resource_default, Conclusion::Deny);
        assert!(document.class_rules.is_empty());
        assert!(document.resource_rules.is_empty());

        let policy = document.compile().unwrap();
        assert!(!policy.allows_class("java.lang.Object"));
        assert!(!policy.allows_resource("hello.txt"));
    }

    #[test]
    fn test_document_compiles_to_working_policy() {
        let document = PolicyDocument::from_json_str(
            r#"{
                "class_default": "deny",
                "resource_default": "allow",
                "class_rules": [
                    { "pattern": "java\\.lang\\.Object", "conclusion": "allow", "quick": true },
                    { "pattern": "java\\.lang\\.Integer", "conclusion": "allow", "quick": true }
                ],
                "resource_rules": [
                    { "pattern": "secret\\.txt", "conclusion": "deny", "quick": true }
                ]
            }"#,
        )
        .unwrap();

        let policy = document.compile().unwrap();
        assert!(policy.allows_class("java.lang.Object"));
        assert!(policy.allows_class("java.lang.Integer"));
        assert!(!policy.allows_class("java.lang.Float"));
        assert!(!policy.allows_resource("secret.txt"));
        assert!(policy.allows_resource("public.txt"));
    }

    #[test]
    fn test_quick_defaults_to_false() {
        let document = PolicyDocument::from_json_str(
            r#"{ "class_rules": [ { "pattern": ".*", "conclusion": "allow" } ] }"#,
        )
        .unwrap();
        assert!(!document.class_rules[0].quick);
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = PolicyDocument::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_pattern_fails_compile() {
        let document = PolicyDocument::from_json_str(
            r#"{ "class_rules": [ { "pattern": "[", "conclusion": "allow" } ] }"#,
        )
        .unwrap();
        let err = document.compile().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern { ref pattern, .. } if pattern == "["
        ));
    }

    #[test]
    fn test_load_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("policy.json");
        fs::write(
            &path,
            r#"{ "class_default": "allow", "resource_default": "deny" }"#,
        )
        .unwrap();

        let document = PolicyDocument::load(&path).unwrap();
        assert_eq!(document.class_default, Conclusion::Allow);
        assert_eq!(document.resource_default, Conclusion::Deny);
    }

    #[test]
    fn test_load_missing_file_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let err = PolicyDocument::load(temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_layered_later_file_wins_per_field() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base.json");
        let site = temp.path().join("site.json");

        fs::write(
            &base,
            r#"{
                "class_default": "allow",
                "resource_default": "allow",
                "class_rules": [
                    { "pattern": "base\\..*", "conclusion": "deny", "quick": true }
                ]
            }"#,
        )
        .unwrap();
        fs::write(&site, r#"{ "class_default": "deny" }"#).unwrap();

        let document = PolicyDocument::load_layered(&[&base, &site]).unwrap();

        // Overridden by the later layer.
        assert_eq!(document.class_default, Conclusion::Deny);
        // Untouched fields survive from the earlier layer.
        assert_eq!(document.resource_default, Conclusion::Allow);
        assert_eq!(document.class_rules.len(), 1);
        assert_eq!(document.class_rules[0].pattern, "base\\..*");
    }

    #[test]
    fn test_load_layered_replaces_rule_lists_wholesale() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base.json");
        let site = temp.path().join("site.json");

        fs::write(
            &base,
            r#"{ "class_rules": [ { "pattern": "a", "conclusion": "allow" } ] }"#,
        )
        .unwrap();
        fs::write(
            &site,
            r#"{ "class_rules": [ { "pattern": "b", "conclusion": "allow" } ] }"#,
        )
        .unwrap();

        let document = PolicyDocument::load_layered(&[&base, &site]).unwrap();
        assert_eq!(document.class_rules.len(), 1);
        assert_eq!(document.class_rules[0].pattern, "b");
    }

    #[test]
    fn test_document_serde_round_trip() {
        let document = PolicyDocument {
            class_default: Conclusion::Allow,
            resource_default: Conclusion::Deny,
            class_rules: vec![RuleDef {
                pattern: "x".to_string(),
                conclusion: Conclusion::Deny,
                quick: true,
            }],
            resource_rules: Vec::new(),
        };

        let json = serde_json::to_string(&document).unwrap();
        let parsed = PolicyDocument::from_json_str(&json).unwrap();
        assert_eq!(parsed.class_default, Conclusion::Allow);
        assert_eq!(parsed.class_rules[0].pattern, "x");
        assert!(parsed.class_rules[0].quick);
    }
}
