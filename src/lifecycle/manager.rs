//! Runtime Manager
//!
//! Loads every map found in the base directory on first use, serves
//! snapshots of them while they are warm, and releases them again after a
//! period without activity.

use super::registry::Registry;
use super::{
    Credential, CredentialReader, DescriptorSource, LifecycleError, MapDescriptor, MapStore,
    Result, RuntimeManagerBuilder, idle,
};
use crate::config::RuntimeConfig;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Lifecycle state of the whole map set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ManagerState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
}

impl ManagerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Result of a successful [`RuntimeManager::ensure_started`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Maps were already loaded; nothing was done
    AlreadyRunning,
    /// This call ran a load cycle
    Started {
        /// Names registered, sorted
        loaded: Vec<String>,
        /// Descriptors whose construction failed
        failed: Vec<String>,
    },
}

/// Everything guarded by the manager's single lock
pub(super) struct Inner<H> {
    pub(super) registry: Registry<H>,
    pub(super) idle_task: Option<JoinHandle<()>>,
}

pub(super) struct Shared<S: MapStore> {
    pub(super) config: RuntimeConfig,
    pub(super) store: Arc<S>,
    pub(super) source: Arc<dyn DescriptorSource>,
    pub(super) credentials: Arc<dyn CredentialReader>,
    state: AtomicU8,
    epoch: Instant,
    last_activity_ms: AtomicU64,
    inner: Arc<Mutex<Inner<S::Handle>>>,
}

/// Owns the registry of loaded maps and drives their lifecycle
///
/// The manager is cheap to clone; every clone refers to the same registry.
/// It is meant to be built once at process start and handed to request
/// handlers.
///
/// # Example
///
/// ```rust,ignore
/// use mapkeeper::lifecycle::RuntimeManager;
///
/// let manager = RuntimeManager::builder()
///     .config(config)
///     .store(Arc::new(store))
///     .build()?;
///
/// manager.note_activity();
/// manager.ensure_started().await.ok();
/// let office = manager.get("office").await?;
///
/// // On process teardown
/// manager.shutdown().await;
/// ```
pub struct RuntimeManager<S: MapStore> {
    shared: Arc<Shared<S>>,
}

impl<S: MapStore> Clone for RuntimeManager<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Non-owning reference held by the idle checker
pub(super) struct WeakRuntimeManager<S: MapStore> {
    shared: Weak<Shared<S>>,
}

impl<S: MapStore> WeakRuntimeManager<S> {
    pub(super) fn upgrade(&self) -> Option<RuntimeManager<S>> {
        self.shared.upgrade().map(|shared| RuntimeManager { shared })
    }
}

impl<S: MapStore> RuntimeManager<S> {
    /// Create a new builder
    pub fn builder() -> RuntimeManagerBuilder<S> {
        RuntimeManagerBuilder::new()
    }

    pub(super) fn from_parts(
        config: RuntimeConfig,
        store: Arc<S>,
        source: Arc<dyn DescriptorSource>,
        credentials: Arc<dyn CredentialReader>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                store,
                source,
                credentials,
                state: AtomicU8::new(ManagerState::Stopped as u8),
                epoch: Instant::now(),
                last_activity_ms: AtomicU64::new(0),
                inner: Arc::new(Mutex::new(Inner {
                    registry: Registry::default(),
                    idle_task: None,
                })),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    /// Current state, read without taking the lock
    pub fn state(&self) -> ManagerState {
        ManagerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == ManagerState::Running
    }

    /// Record that a caller used the maps just now
    pub fn note_activity(&self) {
        let now = millis(self.shared.epoch.elapsed());
        // fetch_max keeps the timestamp monotonic under racing writers
        self.shared
            .last_activity_ms
            .fetch_max(now, Ordering::AcqRel);
    }

    /// Time elapsed since the last recorded activity
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.shared.last_activity_ms.load(Ordering::Acquire));
        self.shared.epoch.elapsed().saturating_sub(last)
    }

    /// Load all maps unless they are already loaded
    ///
    /// Concurrent callers are serialized: the first one runs the load cycle,
    /// the others wait for it and then see `AlreadyRunning`. The load cycle
    /// runs on its own task, so dropping the returned future does not leave
    /// the registry half-populated.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::NotConfigured`] when the credential is missing
    /// - [`LifecycleError::NoResourcesLoaded`] when no map could be built
    /// - [`LifecycleError::Discovery`] / [`LifecycleError::Io`] on filesystem faults
    ///
    /// In every error case the manager stays `Stopped` and a later call
    /// retries from scratch.
    pub async fn ensure_started(&self) -> Result<StartOutcome> {
        if self.is_running() {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let guard = Arc::clone(&self.shared.inner).lock_owned().await;
        if self.is_running() {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let manager = self.clone();
        match tokio::spawn(async move { manager.start_locked(guard).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Load cycle aborted: {}", e);
                let mut inner = self.lock_inner().await;
                if self.state() == ManagerState::Starting {
                    self.release_all(&mut inner.registry).await;
                    self.set_state(ManagerState::Stopped);
                }
                Err(LifecycleError::init_failed(format!(
                    "load cycle aborted: {}",
                    e
                )))
            }
        }
    }

    async fn start_locked(
        &self,
        mut inner: OwnedMutexGuard<Inner<S::Handle>>,
    ) -> Result<StartOutcome> {
        self.set_state(ManagerState::Starting);

        // Leftovers can only exist if a previous cycle died mid-way
        if !inner.registry.is_empty() {
            self.release_all(&mut inner.registry).await;
        }

        match self.load(&mut inner.registry).await {
            Ok(failed) => {
                let loaded: Vec<String> = inner.registry.names().into_iter().collect();
                self.set_state(ManagerState::Running);
                self.note_activity();

                if inner.idle_task.is_none() {
                    inner.idle_task = Some(idle::spawn(
                        self.downgrade(),
                        self.shared.config.idle_check_interval,
                    ));
                }

                tracing::info!(
                    "Maps started, count={} default={}",
                    loaded.len(),
                    inner.registry.default_name().unwrap_or_default()
                );
                Ok(StartOutcome::Started { loaded, failed })
            }
            Err(e) => {
                if !inner.registry.is_empty() {
                    self.release_all(&mut inner.registry).await;
                }
                self.set_state(ManagerState::Stopped);
                Err(e)
            }
        }
    }

    /// One load cycle. On success the registry is non-empty and the names of
    /// failed descriptors are returned.
    async fn load(&self, registry: &mut Registry<S::Handle>) -> Result<Vec<String>> {
        let config = &self.shared.config;
        let base_dir = config.base_dir.as_path();

        self.shared.source.prepare(base_dir).await?;

        let credential_path = config.credential_path();
        tracing::debug!("Looking for credential: {}", credential_path.display());
        let credential = match self.shared.credentials.read(&credential_path).await? {
            Some(credential) if !credential.is_empty() => credential,
            _ => {
                tracing::warn!(
                    "Credential {} not found, cannot start maps",
                    credential_path.display()
                );
                return Err(LifecycleError::NotConfigured {
                    path: credential_path,
                });
            }
        };

        let descriptors = self.shared.source.discover(base_dir).await?;
        tracing::info!(
            "Starting maps, {} descriptor(s) in {}",
            descriptors.len(),
            base_dir.display()
        );

        let mut failed = Vec::new();
        for descriptor in descriptors {
            match self.construct(&descriptor, &credential).await {
                Ok(handle) => {
                    tracing::info!(
                        "Map loaded: {} -> {:?}",
                        descriptor.location.display(),
                        handle
                    );
                    if let Some(displaced) = registry.insert(descriptor.name.clone(), handle) {
                        tracing::warn!(
                            "Duplicate map name {}, releasing the earlier instance",
                            descriptor.name
                        );
                        self.teardown(&descriptor.name, &displaced).await;
                    }
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    failed.push(descriptor.name);
                }
            }
        }

        if registry.is_empty() {
            tracing::warn!(
                "No maps could be loaded from {}, cannot start maps",
                base_dir.display()
            );
            return Err(LifecycleError::NoResourcesLoaded {
                base_dir: base_dir.to_path_buf(),
            });
        }

        Ok(failed)
    }

    async fn construct(
        &self,
        descriptor: &MapDescriptor,
        credential: &Credential,
    ) -> Result<S::Handle> {
        let build = self.shared.store.construct(descriptor, credential);
        let result = match self.shared.config.construct_timeout {
            Some(limit) => tokio::time::timeout(limit, build).await.map_err(|_| {
                LifecycleError::timeout(
                    "construct",
                    format!("{} took longer than {:?}", descriptor.name, limit),
                )
            })?,
            None => build.await,
        };
        result.map_err(|e| {
            LifecycleError::construction_failed(&descriptor.name, format!("{:#}", e))
        })
    }

    /// Fetch a snapshot of the named map; an empty name means the default map
    pub async fn get(&self, name: &str) -> Result<S::View> {
        let label = if name.is_empty() { "<default>" } else { name };
        let inner = self.lock_inner().await;
        if !self.is_running() {
            return Err(LifecycleError::not_found(label));
        }

        let Some((resolved, handle)) = inner.registry.resolve(name) else {
            return Err(LifecycleError::not_found(label));
        };

        self.shared.store.fetch(handle).await.map_err(|e| {
            tracing::warn!("Fetching map {} failed: {:#}", resolved, e);
            LifecycleError::not_found(resolved)
        })
    }

    /// Fetch a snapshot of the first map registered in the current cycle
    pub async fn get_default(&self) -> Result<S::View> {
        self.get("").await.map_err(|_| LifecycleError::Unavailable)
    }

    /// Name of the default map, if running
    pub async fn default_name(&self) -> Option<String> {
        let inner = self.lock_inner().await;
        inner.registry.default_name().map(str::to_string)
    }

    /// Snapshot of the registered names; empty when not running
    pub async fn list_names(&self) -> BTreeSet<String> {
        let inner = self.lock_inner().await;
        if !self.is_running() {
            return BTreeSet::new();
        }
        inner.registry.names()
    }

    /// Release every map and stop the idle checker
    ///
    /// Safe to call any number of times.
    pub async fn shutdown(&self) {
        let mut inner = self.lock_inner().await;

        if let Some(task) = inner.idle_task.take() {
            task.abort();
            tracing::debug!("Idle checker cancelled");
        }

        if self.is_running() {
            tracing::info!("Shutdown: releasing maps count={}", inner.registry.len());
        }
        self.release_all(&mut inner.registry).await;
        self.set_state(ManagerState::Stopped);
    }

    pub(super) async fn lock_inner(&self) -> MutexGuard<'_, Inner<S::Handle>> {
        self.shared.inner.lock().await
    }

    pub(super) fn set_state(&self, state: ManagerState) {
        self.shared.state.store(state as u8, Ordering::Release);
    }

    pub(super) fn downgrade(&self) -> WeakRuntimeManager<S> {
        WeakRuntimeManager {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Tear down and drop every registered map, continuing past failures.
    /// Returns the number of failed teardowns.
    pub(super) async fn release_all(&self, registry: &mut Registry<S::Handle>) -> usize {
        let mut failures = 0;
        for (name, handle) in registry.drain() {
            if !self.teardown(&name, &handle).await {
                failures += 1;
            }
        }
        failures
    }

    async fn teardown(&self, name: &str, handle: &S::Handle) -> bool {
        match self.shared.store.teardown(handle).await {
            Ok(()) => {
                tracing::debug!("Map released: {} ({:?})", name, handle);
                true
            }
            Err(e) => {
                let err = LifecycleError::teardown_failed(name, format!("{:#}", e));
                tracing::error!("{}", err);
                false
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
