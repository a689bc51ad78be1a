//! # Loadgate
//!
//! A capability gatekeeper for class and resource loading: requests to
//! load a named class or resource are checked against a policy, then
//! either forwarded to an underlying provider or refused with a denial
//! error.
//!
//! ## Overview
//!
//! The crate is built around three pieces:
//!
//! 1. **Rules and chains**: a [`Rule`] pairs a whole-string pattern with
//!    a [`Conclusion`] (allow or deny) and a `quick` flag; a [`RuleChain`]
//!    evaluates rules first to last, where the last non-quick match wins
//!    and a quick match ends evaluation immediately. The scheme follows
//!    the rule chains of packet filters such as OpenBSD PF: rule order is
//!    part of the policy's meaning.
//! 2. **Policies**: [`ConstantPolicy`] answers every request with a
//!    fixed conclusion; [`SequentialPolicy`] keeps two independent
//!    chains, one for classes and one for resources, each with its own
//!    default. Both implement [`LoadPolicy`].
//! 3. **The gatekeeper**: [`RestrictedLoader`] holds a policy and a
//!    delegate [`Provider`]; allowed requests are forwarded verbatim,
//!    refused requests fail with [`AccessError::Denied`] and never reach
//!    the delegate.
//!
//! ## Quick Start
//!
//! ```rust
//! use loadgate::{Conclusion, LoadPolicy, SequentialPolicy};
//!
//! // Deny everything except two specific classes.
//! let mut builder = SequentialPolicy::builder(Conclusion::Deny, Conclusion::Deny);
//! builder
//!     .add_class_rule("java\\.lang\\.Object", Conclusion::Allow, true)?
//!     .add_class_rule("java\\.lang\\.Integer", Conclusion::Allow, true)?;
//! let policy = builder.build();
//!
//! assert!(policy.allows_class("java.lang.Object"));
//! assert!(policy.allows_class("java.lang.Integer"));
//! assert!(!policy.allows_class("java.lang.Float"));
//! # Ok::<(), loadgate::ConfigError>(())
//! ```
//!
//! ## Gating a provider
//!
//! ```rust,no_run
//! use loadgate::{Conclusion, DirProvider, RestrictedLoader, SequentialPolicy};
//!
//! let mut builder = SequentialPolicy::builder(Conclusion::Deny, Conclusion::Allow);
//! builder.add_resource_rule("secret\\.txt", Conclusion::Deny, true)?;
//!
//! let provider = DirProvider::new(vec!["assets".into()]);
//! let loader = RestrictedLoader::new(provider, builder.build());
//!
//! // Allowed: forwarded to the provider.
//! let _location = loader.resolve_resource("public.txt")?;
//!
//! // Denied: fails without ever touching the provider.
//! assert!(loader.resolve_resource("secret.txt").is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Declarative policies
//!
//! Policies can also be described as JSON documents and compiled through
//! the same builder, with layered file loading for site/user overrides:
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
//! let policy = document.compile()?;
//!
//! assert!(policy.allows_class("java.lang.String"));
//! # Ok::<(), loadgate::ConfigError>(())
//! ```
//!
//! ## Concurrency
//!
//! Policies and chains are immutable after construction and the loader
//! holds no mutable state, so a single [`RestrictedLoader`] may be shared
//! and invoked from any number of threads without synchronization. The
//! only synchronization concern is whatever the delegate provider itself
//! requires.

pub mod document;
pub mod error;
pub mod loader;
pub mod policy;
pub mod provider;
pub mod rule;

pub use document::{PolicyDocument, RuleDef};
pub use error::{AccessError, ConfigError};
pub use loader::RestrictedLoader;
pub use policy::{
    ConstantPolicy, LoadPolicy, RequestKind, SequentialPolicy, SequentialPolicyBuilder,
};
pub use provider::{ClassHandle, DirProvider, Provider, ProviderError, ResourceLocation};
pub use rule::{Conclusion, Rule, RuleChain};
