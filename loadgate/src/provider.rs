//! The delegate provider: the collaborator that actually resolves and
//! loads classes or resources once the policy permits a request.
//!
//! [`Provider`] is the minimal capability set the gatekeeper forwards to.
//! [`DirProvider`] is a reference implementation backed by an ordered
//! list of filesystem roots; custom providers (archives, registries,
//! remote stores) implement the same trait.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{Level, instrument};

/// Errors raised by a provider while serving an allowed request.
///
/// These pass through the gatekeeper unchanged, so callers can tell
/// "refused by policy" from "not present in the provider".
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The named class is not present in the provider.
    #[error("class not found: {0}")]
    NotFound(String),

    /// An I/O failure inside the provider.
    #[error("provider I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure a custom provider needs to surface.
    #[error("provider error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// An opaque location for a resolved resource, in URL-like form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation(String);

impl ResourceLocation {
    /// Creates a location from its string form.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Creates a `file:` location for a filesystem path.
    pub fn from_path(path: &Path) -> Self {
        Self(format!("file:{}", path.display()))
    }

    /// Returns the location string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The opaque token a provider returns for a successfully loaded class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHandle {
    name: String,
    location: Option<ResourceLocation>,
}

impl ClassHandle {
    /// Creates a handle for the named class.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
        }
    }

    /// Attaches the location the class was loaded from.
    pub fn with_location(mut self, location: ResourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns the class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the location the class was loaded from, if known.
    pub fn location(&self) -> Option<&ResourceLocation> {
        self.location.as_ref()
    }
}

/// The capability set the gatekeeper delegates to.
///
/// Implementations may block (e.g. on file or network I/O); the decision
/// engine in front of them never does. Absence of a resource is `Ok(None)`
/// rather than an error; absence of a class is [`ProviderError::NotFound`].
pub trait Provider {
    /// Resolves the named resource to a location, if present.
    fn resolve_resource(&self, name: &str) -> Result<Option<ResourceLocation>, ProviderError>;

    /// Opens the named resource for reading, if present.
    fn open_resource_stream(
        &self,
        name: &str,
    ) -> Result<Option<Box<dyn Read + Send>>, ProviderError>;

    /// Resolves every location the named resource is present at, in
    /// provider order. The returned sequence is finite; calling again
    /// restarts it.
    fn resolve_resources(&self, name: &str) -> Result<Vec<ResourceLocation>, ProviderError>;

    /// Loads the named class, or fails with [`ProviderError::NotFound`].
    fn load_by_name(&self, name: &str) -> Result<ClassHandle, ProviderError>;

    /// Sets the desired assertion status for the named class.
    fn set_assertion_status(&self, name: &str, enabled: bool) -> Result<(), ProviderError>;
}

/// A provider backed by an ordered list of filesystem roots.
///
/// Resource names are relative paths under the roots; the first root
/// containing a name wins. Class names are dotted (`a.b.C`) and map to
/// `a/b/C` plus a configurable suffix. Names that would escape the roots
/// (absolute paths, `..` components) resolve to nothing.
///
/// ## Example
///
/// ```rust,no_run
/// use loadgate::{DirProvider, Provider};
///
/// let provider = DirProvider::new(vec!["classes".into(), "extra".into()]);
/// let _handle = provider.load_by_name("java.lang.Object")?;
/// # Ok::<(), loadgate::ProviderError>(())
/// ```
#[derive(Debug)]
pub struct DirProvider {
    roots: Vec<PathBuf>,
    class_suffix: String,
    assertions: Mutex<HashMap<String, bool>>,
}

impl DirProvider {
    /// Creates a provider over the given roots, searched in order.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            class_suffix: ".class".to_string(),
            assertions: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the filename suffix appended to mapped class names.
    pub fn with_class_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.class_suffix = suffix.into();
        self
    }

    /// Returns the recorded assertion status for a class, if any was set.
    pub fn assertion_status(&self, name: &str) -> Option<bool> {
        let assertions = self.assertions.lock().unwrap_or_else(|e| e.into_inner());
        assertions.get(name).copied()
    }

    /// Validates a resource name as a root-relative path.
    ///
    /// Absolute names and names containing `..` never resolve; they would
    /// walk outside the configured roots.
    fn safe_relative(name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return None;
        }

        let mut relative = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if relative.as_os_str().is_empty() {
            None
        } else {
            Some(relative)
        }
    }

    /// Maps a dotted class name to its root-relative file path.
    fn class_relative(&self, name: &str) -> Option<PathBuf> {
        let path = format!("{}{}", name.replace('.', "/"), self.class_suffix);
        Self::safe_relative(&path)
    }

    /// Returns the first root-relative match for `relative`, if any.
    fn first_match(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
    }
}

impl Provider for DirProvider {
    #[instrument(level = Level::TRACE, skip(self))]
    fn resolve_resource(&self, name: &str) -> Result<Option<ResourceLocation>, ProviderError> {
        let Some(relative) = Self::safe_relative(name) else {
            return Ok(None);
        };
        Ok(self
            .first_match(&relative)
            .map(|path| ResourceLocation::from_path(&path)))
    }

    #[instrument(level = Level::TRACE, skip(self))]
    fn open_resource_stream(
        &self,
        name: &str,
    ) -> Result<Option<Box<dyn Read + Send>>, ProviderError> {
        let Some(relative) = Self::safe_relative(name) else {
            return Ok(None);
        };
        match self.first_match(&relative) {
            Some(path) => {
                let file = File::open(path)?;
                Ok(Some(Box::new(file)))
            }
            None => Ok(None),
        }
    }

    #[instrument(level = Level::TRACE, skip(self))]
    fn resolve_resources(&self, name: &str) -> Result<Vec<ResourceLocation>, ProviderError> {
        let Some(relative) = Self::safe_relative(name) else {
            return Ok(Vec::new());
        };
        Ok(self
            .roots
            .iter()
            .map(|root| root.join(&relative))
            .filter(|candidate| candidate.is_file())
            .map(|path| ResourceLocation::from_path(&path))
            .collect())
    }

    #[instrument(level = Level::TRACE, skip(self))]
    fn load_by_name(&self, name: &str) -> Result<ClassHandle, ProviderError> {
        let relative = self
            .class_relative(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;
        let path = self
            .first_match(&relative)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        Ok(ClassHandle::new(name).with_location(ResourceLocation::from_path(&path)))
    }

    #[instrument(level = Level::TRACE, skip(self))]
    fn set_assertion_status(&self, name: &str, enabled: bool) -> Result<(), ProviderError> {
        let mut assertions = self.assertions.lock().unwrap_or_else(|e| e.into_inner());
        assertions.insert(name.to_string(), enabled);
        Ok(())
    }
}
