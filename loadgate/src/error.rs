//! Error types for policy configuration and gated access.

use std::path::PathBuf;

use thiserror::Error;

use crate::policy::RequestKind;
use crate::provider::ProviderError;

/// Errors raised while configuring a policy.
///
/// These are fatal to policy setup and never occur during evaluation:
/// a policy that built successfully cannot fail a decision.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A rule pattern failed to compile.
    #[error("invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A policy document file could not be read.
    #[error("failed to read policy document from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A policy document could not be parsed.
    #[error("failed to parse policy document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Figment failed to extract a layered policy document.
    #[error("configuration error: {0}")]
    Figment(#[source] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

/// Errors surfaced by the gatekeeper for a single request.
///
/// [`Denied`](AccessError::Denied) is the expected refusal outcome and is
/// recoverable by the caller; it is never retried internally. Delegate
/// failures pass through as [`Provider`](AccessError::Provider), a
/// distinct kind, so callers can tell "refused by policy" from "not
/// present in the provider".
#[derive(Debug, Error)]
pub enum AccessError {
    /// The supplied name was empty. Caller bug, not retried.
    #[error("{kind} name must not be empty")]
    EmptyName { kind: RequestKind },

    /// The policy refused the request. The delegate was never invoked.
    #[error("access denied: {kind} '{name}'")]
    Denied { kind: RequestKind, name: String },

    /// The delegate failed while serving an allowed request.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
