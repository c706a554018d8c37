//! Collaborator traits
//!
//! The manager never builds, reads, or renders maps itself. These traits
//! define what it needs from the code that does.

use super::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// A named reference to a loadable source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDescriptor {
    /// Registry key, e.g. `office` for `office.json`
    pub name: String,
    /// Where the source lives
    pub location: PathBuf,
}

impl MapDescriptor {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Secret material required before any map can be constructed
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, trimming surrounding whitespace
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self(secret.as_ref().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// Lists the descriptors available for one load cycle
///
/// Implementations must not recurse into subdirectories.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Make sure `base_dir` is usable before the credential is read
    async fn prepare(&self, _base_dir: &Path) -> Result<()> {
        Ok(())
    }

    async fn discover(&self, base_dir: &Path) -> Result<Vec<MapDescriptor>>;
}

/// Reads the credential artifact
///
/// A missing artifact is `Ok(None)`, not an error.
#[async_trait]
pub trait CredentialReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<Option<Credential>>;
}

/// Builds, inspects and releases maps
///
/// # Example
///
/// ```rust,ignore
/// use mapkeeper::lifecycle::{Credential, MapDescriptor, MapStore};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl MapStore for FloorPlans {
///     type Handle = u64;
///     type View = FloorPlan;
///
///     async fn construct(&self, d: &MapDescriptor, _: &Credential) -> anyhow::Result<u64> {
///         self.load(&d.location).await
///     }
///
///     async fn fetch(&self, id: &u64) -> anyhow::Result<FloorPlan> {
///         self.snapshot(*id)
///     }
///
///     async fn teardown(&self, id: &u64) -> anyhow::Result<()> {
///         self.remove(*id)
///     }
/// }
/// ```
#[async_trait]
pub trait MapStore: Send + Sync + 'static {
    /// Opaque identifier of a constructed map
    type Handle: Clone + fmt::Debug + Send + Sync + 'static;
    /// Snapshot handed to callers
    type View: Send + 'static;

    /// Build a map from its source
    async fn construct(
        &self,
        descriptor: &MapDescriptor,
        credential: &Credential,
    ) -> anyhow::Result<Self::Handle>;

    /// Current snapshot of a constructed map
    async fn fetch(&self, handle: &Self::Handle) -> anyhow::Result<Self::View>;

    /// Release a map; must tolerate partially initialized handles
    async fn teardown(&self, handle: &Self::Handle) -> anyhow::Result<()>;
}
