//! Test doubles for the lifecycle collaborators

use crate::config::RuntimeConfig;
use crate::lifecycle::{
    Credential, CredentialReader, DescriptorSource, MapDescriptor, MapStore, Result,
    RuntimeManager, RuntimeManagerBuilder,
};
use anyhow::bail;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FakeView {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) location: String,
}

/// Records every call and fails on demand
#[derive(Default)]
pub(crate) struct FakeStore {
    fail_construct: HashSet<String>,
    fail_teardown: HashSet<String>,
    panic_on: Option<String>,
    delay: Option<Duration>,
    next_id: AtomicU64,
    construct_calls: AtomicUsize,
    live: DashMap<u64, FakeView>,
    torn_down: Mutex<Vec<String>>,
}

impl FakeStore {
    pub(crate) fn failing(names: &[&str]) -> Self {
        Self {
            fail_construct: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_failing_teardown(mut self, names: &[&str]) -> Self {
        self.fail_teardown = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub(crate) fn panicking_on(mut self, name: &str) -> Self {
        self.panic_on = Some(name.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn construct_calls(&self) -> usize {
        self.construct_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn torn_down(&self) -> Vec<String> {
        self.torn_down.lock().unwrap().clone()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Drop every map behind the manager's back
    pub(crate) fn forget_all(&self) {
        self.live.clear();
    }
}

#[async_trait]
impl MapStore for FakeStore {
    type Handle = u64;
    type View = FakeView;

    async fn construct(
        &self,
        descriptor: &MapDescriptor,
        _credential: &Credential,
    ) -> anyhow::Result<u64> {
        self.construct_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic_on.as_deref() == Some(descriptor.name.as_str()) {
            panic!("map source {} crashed the loader", descriptor.location.display());
        }
        if self.fail_construct.contains(&descriptor.name) {
            bail!("corrupt map source {}", descriptor.location.display());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live.insert(
            id,
            FakeView {
                id,
                name: descriptor.name.clone(),
                location: descriptor.location.display().to_string(),
            },
        );
        Ok(id)
    }

    async fn fetch(&self, handle: &u64) -> anyhow::Result<FakeView> {
        match self.live.get(handle) {
            Some(view) => Ok(view.clone()),
            None => bail!("map {} is gone", handle),
        }
    }

    async fn teardown(&self, handle: &u64) -> anyhow::Result<()> {
        let removed = self.live.remove(handle);
        let name = removed.map(|(_, v)| v.name).unwrap_or_default();
        self.torn_down.lock().unwrap().push(name.clone());
        if self.fail_teardown.contains(&name) {
            bail!("{} refused to release", name);
        }
        Ok(())
    }
}

pub(crate) struct StaticSource(pub(crate) Vec<MapDescriptor>);

#[async_trait]
impl DescriptorSource for StaticSource {
    async fn discover(&self, _base_dir: &Path) -> Result<Vec<MapDescriptor>> {
        Ok(self.0.clone())
    }
}

pub(crate) struct StaticCredential(Option<String>);

impl StaticCredential {
    pub(crate) fn new(secret: &str) -> Self {
        Self(Some(secret.to_string()))
    }

    pub(crate) fn missing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CredentialReader for StaticCredential {
    async fn read(&self, _path: &Path) -> Result<Option<Credential>> {
        Ok(self.0.as_deref().map(Credential::new))
    }
}

/// Idle timeout 20s, checked every 30s
pub(crate) fn config() -> RuntimeConfig {
    RuntimeConfig::default().with_base_dir("/nonexistent/mapkeeper")
}

pub(crate) fn builder_with_descriptors(
    store: &Arc<FakeStore>,
    descriptors: Vec<MapDescriptor>,
) -> RuntimeManagerBuilder<FakeStore> {
    RuntimeManager::builder()
        .config(config())
        .store(Arc::clone(store))
        .descriptor_source(StaticSource(descriptors))
        .credential_reader(StaticCredential::new("secret"))
}

pub(crate) fn builder(store: &Arc<FakeStore>, names: &[&str]) -> RuntimeManagerBuilder<FakeStore> {
    let descriptors = names
        .iter()
        .map(|n| MapDescriptor::new(*n, format!("{}.json", n)))
        .collect();
    builder_with_descriptors(store, descriptors)
}

pub(crate) fn manager_with(store: &Arc<FakeStore>, names: &[&str]) -> RuntimeManager<FakeStore> {
    builder(store, names).build().unwrap()
}
