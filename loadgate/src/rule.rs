//! Firewall-style rules and sequential chain evaluation.
//!
//! A [`Rule`] pairs a whole-string pattern with a [`Conclusion`] and a
//! `quick` flag. A [`RuleChain`] evaluates a name against its rules from
//! first to last: the *current conclusion* starts at the chain's default,
//! every matching rule overwrites it, and a matching rule marked `quick`
//! ends evaluation on the spot. The scheme is borrowed from the rule
//! chains of packet filters such as OpenBSD PF, where rule order is part
//! of the policy's meaning.
//!
//! ## Example
//!
//! ```rust
//! use loadgate::{Conclusion, Rule, RuleChain};
//!
//! let chain = RuleChain::from_rules(vec![
//!     Rule::new("internal\\..*", Conclusion::Deny, true).unwrap(),
//!     Rule::new(".*", Conclusion::Allow, false).unwrap(),
//! ]);
//!
//! assert_eq!(chain.evaluate("internal.secrets", Conclusion::Deny), Conclusion::Deny);
//! assert_eq!(chain.evaluate("public.api", Conclusion::Deny), Conclusion::Allow);
//! ```

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

use crate::error::ConfigError;

/// The binary outcome of a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    /// The request is permitted.
    Allow,
    /// The request is refused.
    Deny,
}

impl Conclusion {
    /// Returns true if this conclusion permits the request.
    pub fn permits(self) -> bool {
        matches!(self, Conclusion::Allow)
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conclusion::Allow => write!(f, "allow"),
            Conclusion::Deny => write!(f, "deny"),
        }
    }
}

/// A single evaluation rule: pattern, conclusion, and short-circuit flag.
///
/// The pattern is compiled once at construction and always matches the
/// whole name, never a substring. A malformed pattern fails here with
/// [`ConfigError::InvalidPattern`]; evaluation itself cannot fail.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    regex: Regex,
    conclusion: Conclusion,
    quick: bool,
}

impl Rule {
    /// Compiles a rule from a regex pattern.
    ///
    /// The pattern is anchored on both ends, so `secret\.txt` matches
    /// exactly `secret.txt` and nothing longer.
    pub fn new(pattern: &str, conclusion: Conclusion, quick: bool) -> Result<Self, ConfigError> {
        let regex =
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            conclusion,
            quick,
        })
    }

    /// Returns true if the whole of `name` matches this rule's pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Returns the source pattern this rule was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the conclusion this rule produces when matched.
    pub fn conclusion(&self) -> Conclusion {
        self.conclusion
    }

    /// Returns true if a match on this rule ends evaluation immediately.
    pub fn is_quick(&self) -> bool {
        self.quick
    }
}

/// An ordered, immutable sequence of rules for one decision axis.
///
/// Insertion order is evaluation order. Chains are assembled by the
/// policy builder and never change afterwards; evaluation is a pure read,
/// safe for any number of concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Creates a chain from rules in evaluation order.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Returns the number of rules in the chain.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the chain holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates the rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Evaluates `name` against the chain.
    ///
    /// The current conclusion starts at `default`. Each rule is tried in
    /// insertion order; a match overwrites the current conclusion, and a
    /// match on a quick rule returns it immediately, so later rules are
    /// never consulted even if they would match. If no rule matches,
    /// `default` is returned unchanged.
    ///
    /// `name` must be non-empty; the gatekeeper validates this before any
    /// policy is consulted.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn evaluate(&self, name: &str, default: Conclusion) -> Conclusion {
        let mut conclusion = default;

        for (index, rule) in self.rules.iter().enumerate() {
            let matched = rule.matches(name);
            tracing::trace!(
                index,
                pattern = rule.pattern(),
                quick = rule.is_quick(),
                matched,
                "rule considered"
            );

            if matched {
                conclusion = rule.conclusion();
                if rule.is_quick() {
                    tracing::debug!(
                        index,
                        pattern = rule.pattern(),
                        %conclusion,
                        "quick rule matched, evaluation stopped"
                    );
                    return conclusion;
                }
            }
        }

        tracing::debug!(%conclusion, "chain exhausted");
        conclusion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, conclusion: Conclusion, quick: bool) -> Rule {
        Rule::new(pattern, conclusion, quick).unwrap()
    }

    #[test]
    fn test_invalid_pattern_fails_at_construction() {
        let err = Rule::new("[", Conclusion::Allow, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern { ref pattern, .. } if pattern == "["
        ));
    }

    #[test]
    fn test_match_is_whole_string() {
        let r = rule("java\\.lang\\.Object", Conclusion::Allow, false);
        assert!(r.matches("java.lang.Object"));
        assert!(!r.matches("java.lang.ObjectX"));
        assert!(!r.matches("xjava.lang.Object"));
        assert!(!r.matches("java.lang"));
    }

    #[test]
    fn test_empty_chain_returns_default() {
        let chain = RuleChain::default();
        assert_eq!(chain.evaluate("anything", Conclusion::Allow), Conclusion::Allow);
        assert_eq!(chain.evaluate("anything", Conclusion::Deny), Conclusion::Deny);
    }

    #[test]
    fn test_no_matching_rule_returns_default() {
        let chain = RuleChain::from_rules(vec![
            rule("alpha", Conclusion::Allow, false),
            rule("beta", Conclusion::Allow, true),
        ]);
        assert_eq!(chain.evaluate("gamma", Conclusion::Deny), Conclusion::Deny);
    }

    #[test]
    fn test_last_non_quick_match_wins() {
        let chain = RuleChain::from_rules(vec![
            rule(".*", Conclusion::Allow, false),
            rule("secret\\..*", Conclusion::Deny, false),
        ]);
        assert_eq!(chain.evaluate("secret.txt", Conclusion::Allow), Conclusion::Deny);
        assert_eq!(chain.evaluate("public.txt", Conclusion::Deny), Conclusion::Allow);
    }

    #[test]
    fn test_quick_match_ignores_later_rules() {
        // The contradicting rule after the quick match is a better textual
        // fit, but must never be consulted.
        let chain = RuleChain::from_rules(vec![
            rule("secret\\..*", Conclusion::Deny, true),
            rule("secret\\.txt", Conclusion::Allow, false),
        ]);
        assert_eq!(chain.evaluate("secret.txt", Conclusion::Allow), Conclusion::Deny);
    }

    #[test]
    fn test_non_quick_match_continues_past_match() {
        let chain = RuleChain::from_rules(vec![
            rule("a.*", Conclusion::Deny, false),
            rule("ab.*", Conclusion::Allow, false),
            rule("abc", Conclusion::Deny, false),
        ]);
        // All three match "abc"; the last one decides.
        assert_eq!(chain.evaluate("abc", Conclusion::Allow), Conclusion::Deny);
        // Only the first two match "abd"; the second decides.
        assert_eq!(chain.evaluate("abd", Conclusion::Deny), Conclusion::Allow);
    }

    #[test]
    fn test_quick_rule_in_middle_stops_iteration() {
        let chain = RuleChain::from_rules(vec![
            rule("x", Conclusion::Deny, false),
            rule(".*", Conclusion::Allow, true),
            rule(".*", Conclusion::Deny, false),
        ]);
        assert_eq!(chain.evaluate("x", Conclusion::Deny), Conclusion::Allow);
    }

    #[test]
    fn test_conclusion_permits() {
        assert!(Conclusion::Allow.permits());
        assert!(!Conclusion::Deny.permits());
    }

    #[test]
    fn test_conclusion_display() {
        assert_eq!(Conclusion::Allow.to_string(), "allow");
        assert_eq!(Conclusion::Deny.to_string(), "deny");
    }

    #[test]
    fn test_conclusion_serde() {
        let json = serde_json::to_string(&Conclusion::Deny).unwrap();
        assert_eq!(json, "\"deny\"");
        let parsed: Conclusion = serde_json::from_str("\"allow\"").unwrap();
        assert_eq!(parsed, Conclusion::Allow);
    }

    #[test]
    fn test_rule_accessors() {
        let r = rule("a.*", Conclusion::Deny, true);
        assert_eq!(r.pattern(), "a.*");
        assert_eq!(r.conclusion(), Conclusion::Deny);
        assert!(r.is_quick());
    }
}
