//! The restricted loader: a gatekeeper that enforces a policy before
//! forwarding any request to its delegate provider.
//!
//! Every operation follows the same path: validate the name, ask the
//! policy for the request's axis, then either forward verbatim to the
//! delegate or fail with [`AccessError::Denied`], in which case the
//! delegate is never invoked. The loader holds no state of its own, so a
//! single instance may be shared across any number of concurrent callers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use loadgate::{Conclusion, DirProvider, RestrictedLoader, SequentialPolicy};
//!
//! let mut builder = SequentialPolicy::builder(Conclusion::Deny, Conclusion::Deny);
//! builder.add_class_rule("java\\.lang\\..*", Conclusion::Allow, true)?;
//! let policy = builder.build();
//!
//! let provider = DirProvider::new(vec!["classes".into()]);
//! let loader = RestrictedLoader::new(provider, policy);
//!
//! let _handle = loader.load_by_name("java.lang.Object")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Read;

use tracing::{Level, instrument};

use crate::error::AccessError;
use crate::policy::{LoadPolicy, RequestKind};
use crate::provider::{ClassHandle, Provider, ResourceLocation};

/// A gatekeeper holding a delegate provider and the policy that guards it.
///
/// Requests the policy refuses fail with [`AccessError::Denied`] carrying
/// the denied name and request kind. Requests the policy permits are
/// forwarded to the delegate, whose failures pass through unchanged as
/// [`AccessError::Provider`].
#[derive(Debug)]
pub struct RestrictedLoader<P, L> {
    delegate: P,
    policy: L,
}

impl<P, L> RestrictedLoader<P, L>
where
    P: Provider,
    L: LoadPolicy,
{
    /// Creates a loader that forwards allowed requests to `delegate`
    /// according to `policy`.
    pub fn new(delegate: P, policy: L) -> Self {
        Self { delegate, policy }
    }

    /// Returns the delegate provider.
    pub fn delegate(&self) -> &P {
        &self.delegate
    }

    /// Returns the policy.
    pub fn policy(&self) -> &L {
        &self.policy
    }

    /// Resolves the named resource through the delegate, if allowed.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn resolve_resource(
        &self,
        name: &str,
    ) -> Result<Option<ResourceLocation>, AccessError> {
        self.check(RequestKind::Resource, name)?;
        Ok(self.delegate.resolve_resource(name)?)
    }

    /// Opens the named resource for reading through the delegate, if
    /// allowed.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn open_resource_stream(
        &self,
        name: &str,
    ) -> Result<Option<Box<dyn Read + Send>>, AccessError> {
        self.check(RequestKind::Resource, name)?;
        Ok(self.delegate.open_resource_stream(name)?)
    }

    /// Resolves every location of the named resource through the
    /// delegate, if allowed.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn resolve_resources(&self, name: &str) -> Result<Vec<ResourceLocation>, AccessError> {
        self.check(RequestKind::Resource, name)?;
        Ok(self.delegate.resolve_resources(name)?)
    }

    /// Loads the named class through the delegate, if allowed.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn load_by_name(&self, name: &str) -> Result<ClassHandle, AccessError> {
        self.check(RequestKind::Class, name)?;
        Ok(self.delegate.load_by_name(name)?)
    }

    /// Sets the assertion status of the named class through the delegate,
    /// if allowed.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn set_assertion_status(&self, name: &str, enabled: bool) -> Result<(), AccessError> {
        self.check(RequestKind::Class, name)?;
        Ok(self.delegate.set_assertion_status(name, enabled)?)
    }

    /// Validates the name and consults the policy for the request's axis.
    ///
    /// On denial the delegate is never reached.
    fn check(&self, kind: RequestKind, name: &str) -> Result<(), AccessError> {
        if name.is_empty() {
            return Err(AccessError::EmptyName { kind });
        }

        let allowed = match kind {
            RequestKind::Class => self.policy.allows_class(name),
            RequestKind::Resource => self.policy.allows_resource(name),
        };

        if allowed {
            tracing::info!(kind = %kind, name, "access allowed");
            Ok(())
        } else {
            tracing::info!(kind = %kind, name, "access denied");
            Err(AccessError::Denied {
                kind,
                name: name.to_string(),
            })
        }
    }
}
