//! Runtime Manager Builder
//!
//! Wires configuration and collaborators into a [`RuntimeManager`].

use super::{CredentialReader, DescriptorSource, LifecycleError, MapStore, Result, RuntimeManager};
use crate::config::RuntimeConfig;
use crate::discovery::{DirectoryScanner, FileCredentialReader};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`RuntimeManager`]
///
/// Only the store is required. The descriptor source defaults to a
/// [`DirectoryScanner`] for the configured extension and the credential
/// reader to a [`FileCredentialReader`].
///
/// # Example
///
/// ```rust,ignore
/// use mapkeeper::lifecycle::RuntimeManager;
///
/// let manager = RuntimeManager::builder()
///     .config(RuntimeConfig::from_service(&ConfigService::from_env())?)
///     .store(Arc::new(JsonMapStore::new(WorkerPool::with_cpu_count()?)))
///     .build()?;
/// ```
pub struct RuntimeManagerBuilder<S: MapStore> {
    config: Option<RuntimeConfig>,
    store: Option<Arc<S>>,
    source: Option<Arc<dyn DescriptorSource>>,
    credentials: Option<Arc<dyn CredentialReader>>,
}

impl<S: MapStore> Default for RuntimeManagerBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MapStore> RuntimeManagerBuilder<S> {
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            source: None,
            credentials: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the map store
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default directory scanner
    pub fn descriptor_source(mut self, source: impl DescriptorSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Replace the default credential file reader
    pub fn credential_reader(mut self, reader: impl CredentialReader + 'static) -> Self {
        self.credentials = Some(Arc::new(reader));
        self
    }

    /// Build the manager. Nothing is loaded until the first
    /// [`RuntimeManager::ensure_started`] call.
    ///
    /// # Errors
    ///
    /// Returns an error if no store was provided or a period is zero.
    pub fn build(self) -> Result<RuntimeManager<S>> {
        let store = self
            .store
            .ok_or_else(|| LifecycleError::init_failed("Map store not provided"))?;
        let config = self.config.unwrap_or_default();

        if config.idle_check_interval == Duration::ZERO {
            return Err(LifecycleError::init_failed(
                "Idle check interval must be greater than zero",
            ));
        }
        if config.idle_timeout == Duration::ZERO {
            return Err(LifecycleError::init_failed(
                "Idle timeout must be greater than zero",
            ));
        }

        let source: Arc<dyn DescriptorSource> = match self.source {
            Some(source) => source,
            None => Arc::new(DirectoryScanner::new(config.descriptor_extension.clone())),
        };
        let credentials: Arc<dyn CredentialReader> = match self.credentials {
            Some(reader) => reader,
            None => Arc::new(FileCredentialReader),
        };

        tracing::debug!(
            "Runtime manager configured: base_dir={} idle_timeout={:?} check_every={:?}",
            config.base_dir.display(),
            config.idle_timeout,
            config.idle_check_interval
        );

        Ok(RuntimeManager::from_parts(config, store, source, credentials))
    }
}
