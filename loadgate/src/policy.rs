//! Policies deciding whether a named class or resource may be loaded.
//!
//! A policy answers two questions, [`allows_class`](LoadPolicy::allows_class)
//! and [`allows_resource`](LoadPolicy::allows_resource), and comes in two
//! variants:
//!
//! - [`ConstantPolicy`] returns a fixed conclusion for every name.
//! - [`SequentialPolicy`] evaluates two independent [`RuleChain`]s, one
//!   per decision axis, each with its own default conclusion. Rules added
//!   for classes never affect resource decisions, and vice versa.
//!
//! Sequential policies are assembled with [`SequentialPolicyBuilder`]:
//! rules accumulate in call order, and `build()` freezes them into an
//! immutable snapshot.
//!
//! ## Example
//!
//! ```rust
//! use loadgate::{Conclusion, LoadPolicy, SequentialPolicy};
//!
//! let mut builder = SequentialPolicy::builder(Conclusion::Deny, Conclusion::Deny);
//! builder
//!     .add_class_rule("java\\.lang\\.Object", Conclusion::Allow, true)?
//!     .add_class_rule("java\\.lang\\.Integer", Conclusion::Allow, true)?;
//! let policy = builder.build();
//!
//! assert!(policy.allows_class("java.lang.Object"));
//! assert!(!policy.allows_class("java.lang.Float"));
//! assert!(!policy.allows_resource("java.lang.Object"));
//! # Ok::<(), loadgate::ConfigError>(())
//! ```

use std::fmt;

use tracing::{Level, instrument};

use crate::error::ConfigError;
use crate::rule::{Conclusion, Rule, RuleChain};

/// The decision axis a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// A class-load request.
    Class,
    /// A resource-load request.
    Resource,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Class => write!(f, "class"),
            RequestKind::Resource => write!(f, "resource"),
        }
    }
}

/// The decision surface consulted by the gatekeeper.
///
/// Names passed to these methods must be non-empty; the gatekeeper
/// validates that before any policy is consulted.
pub trait LoadPolicy {
    /// Returns true if the policy permits loading the named class.
    fn allows_class(&self, name: &str) -> bool;

    /// Returns true if the policy permits loading the named resource.
    fn allows_resource(&self, name: &str) -> bool;
}

/// A policy that returns the same conclusion for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantPolicy {
    default_conclusion: Conclusion,
}

impl ConstantPolicy {
    /// Creates a policy that answers every request with `default_conclusion`.
    pub fn new(default_conclusion: Conclusion) -> Self {
        Self { default_conclusion }
    }

    /// A policy that permits everything.
    pub fn allow_all() -> Self {
        Self::new(Conclusion::Allow)
    }

    /// A policy that refuses everything.
    pub fn deny_all() -> Self {
        Self::new(Conclusion::Deny)
    }

    /// Returns the fixed conclusion.
    pub fn default_conclusion(&self) -> Conclusion {
        self.default_conclusion
    }
}

impl LoadPolicy for ConstantPolicy {
    fn allows_class(&self, _name: &str) -> bool {
        self.default_conclusion.permits()
    }

    fn allows_resource(&self, _name: &str) -> bool {
        self.default_conclusion.permits()
    }
}

/// A sequential, pattern-based policy with independent class and resource
/// chains.
///
/// Built with [`SequentialPolicy::builder`]; immutable once built. A name
/// on the class axis is judged only against the class default and class
/// chain, never the resource chain, and vice versa.
#[derive(Debug, Clone)]
pub struct SequentialPolicy {
    class_default: Conclusion,
    class_chain: RuleChain,
    resource_default: Conclusion,
    resource_chain: RuleChain,
}

impl SequentialPolicy {
    /// Starts a builder with the default conclusion for each axis.
    pub fn builder(
        class_default: Conclusion,
        resource_default: Conclusion,
    ) -> SequentialPolicyBuilder {
        SequentialPolicyBuilder::new(class_default, resource_default)
    }

    /// Returns the default conclusion for class requests.
    pub fn class_default(&self) -> Conclusion {
        self.class_default
    }

    /// Returns the default conclusion for resource requests.
    pub fn resource_default(&self) -> Conclusion {
        self.resource_default
    }

    /// Returns the class rule chain.
    pub fn class_chain(&self) -> &RuleChain {
        &self.class_chain
    }

    /// Returns the resource rule chain.
    pub fn resource_chain(&self) -> &RuleChain {
        &self.resource_chain
    }
}

impl LoadPolicy for SequentialPolicy {
    #[instrument(level = Level::TRACE, skip(self))]
    fn allows_class(&self, name: &str) -> bool {
        let conclusion = self.class_chain.evaluate(name, self.class_default);
        tracing::debug!(kind = %RequestKind::Class, %conclusion, name, "policy conclusion");
        conclusion.permits()
    }

    #[instrument(level = Level::TRACE, skip(self))]
    fn allows_resource(&self, name: &str) -> bool {
        let conclusion = self.resource_chain.evaluate(name, self.resource_default);
        tracing::debug!(kind = %RequestKind::Resource, %conclusion, name, "policy conclusion");
        conclusion.permits()
    }
}

/// Accumulates rules for a [`SequentialPolicy`].
///
/// Rules are appended in call order; `build()` snapshots the accumulated
/// chains into an immutable policy. The builder may be reused afterwards:
/// each `build()` produces an independent snapshot, and rules added later
/// never appear in earlier policies.
#[derive(Debug, Clone)]
pub struct SequentialPolicyBuilder {
    class_default: Conclusion,
    resource_default: Conclusion,
    class_rules: Vec<Rule>,
    resource_rules: Vec<Rule>,
}

impl SequentialPolicyBuilder {
    /// Creates a builder with the default conclusion for each axis.
    pub fn new(class_default: Conclusion, resource_default: Conclusion) -> Self {
        Self {
            class_default,
            resource_default,
            class_rules: Vec::new(),
            resource_rules: Vec::new(),
        }
    }

    /// Appends a rule to the class chain.
    ///
    /// Fails with [`ConfigError::InvalidPattern`] if the pattern does not
    /// compile; a malformed pattern never survives to evaluation time.
    pub fn add_class_rule(
        &mut self,
        pattern: &str,
        conclusion: Conclusion,
        quick: bool,
    ) -> Result<&mut Self, ConfigError> {
        self.class_rules.push(Rule::new(pattern, conclusion, quick)?);
        Ok(self)
    }

    /// Appends a rule to the resource chain.
    ///
    /// Fails with [`ConfigError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn add_resource_rule(
        &mut self,
        pattern: &str,
        conclusion: Conclusion,
        quick: bool,
    ) -> Result<&mut Self, ConfigError> {
        self.resource_rules
            .push(Rule::new(pattern, conclusion, quick)?);
        Ok(self)
    }

    /// Freezes the accumulated rules into an immutable policy.
    pub fn build(&self) -> SequentialPolicy {
        SequentialPolicy {
            class_default: self.class_default,
            class_chain: RuleChain::from_rules(self.class_rules.clone()),
            resource_default: self.resource_default,
            resource_chain: RuleChain::from_rules(self.resource_rules.clone()),
        }
    }
}
