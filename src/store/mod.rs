//! In-memory map store backed by JSON source files

use crate::lifecycle::{Credential, MapDescriptor, MapStore};
use crate::worker::WorkerPool;
use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

struct LoadedMap {
    name: String,
    source: PathBuf,
    document: Value,
    loaded_at: DateTime<Utc>,
}

/// Snapshot of a loaded map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub document: Value,
}

/// Parses each descriptor into a JSON document kept in memory
///
/// Parsing runs on the [`WorkerPool`] so large files do not stall the
/// async runtime.
pub struct JsonMapStore {
    pool: WorkerPool,
    maps: DashMap<Uuid, LoadedMap>,
}

impl JsonMapStore {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            pool,
            maps: DashMap::new(),
        }
    }

    /// Number of maps currently held
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[async_trait]
impl MapStore for JsonMapStore {
    type Handle = Uuid;
    type View = MapView;

    async fn construct(
        &self,
        descriptor: &MapDescriptor,
        _credential: &Credential,
    ) -> anyhow::Result<Uuid> {
        let bytes = tokio::fs::read(&descriptor.location)
            .await
            .with_context(|| format!("reading {}", descriptor.location.display()))?;

        let document = self
            .pool
            .execute(move || serde_json::from_slice::<Value>(&bytes))
            .await?
            .with_context(|| format!("parsing {}", descriptor.location.display()))?;

        if !document.is_object() {
            bail!(
                "{} must contain a JSON object",
                descriptor.location.display()
            );
        }

        let id = Uuid::new_v4();
        self.maps.insert(
            id,
            LoadedMap {
                name: descriptor.name.clone(),
                source: descriptor.location.clone(),
                document,
                loaded_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn fetch(&self, handle: &Uuid) -> anyhow::Result<MapView> {
        let Some(map) = self.maps.get(handle) else {
            bail!("map {} is not loaded", handle);
        };
        Ok(MapView {
            id: *handle,
            name: map.name.clone(),
            source: map.source.display().to_string(),
            loaded_at: map.loaded_at,
            fetched_at: Utc::now(),
            document: map.document.clone(),
        })
    }

    async fn teardown(&self, handle: &Uuid) -> anyhow::Result<()> {
        if self.maps.remove(handle).is_none() {
            tracing::debug!("Map {} already released", handle);
        }
        Ok(())
    }
}
