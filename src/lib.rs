//! # Mapkeeper
//!
//! Lazy-start, idle-evicting lifecycle manager for named map resources.
//!
//! Maps are expensive to load and keep pollers and connections alive while
//! they are in memory. Mapkeeper loads them all on first access, keeps them
//! warm while requests keep coming, and releases them once nobody has asked
//! for a while.
//!
//! ## Features
//!
//! - **Lazy start**: the first caller triggers one load cycle; concurrent callers wait for it
//! - **Partial success**: a map that fails to build is logged and skipped
//! - **Idle eviction**: a background checker tears everything down after inactivity
//! - **Pluggable collaborators**: discovery, credentials and the map store are traits
//! - **Thin HTTP layer**: axum routes for listing and fetching maps
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mapkeeper::config::{ConfigService, RuntimeConfig};
//! use mapkeeper::lifecycle::{RuntimeManager, shutdown_signal};
//! use mapkeeper::store::JsonMapStore;
//! use mapkeeper::worker::WorkerPool;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RuntimeConfig::from_service(&ConfigService::from_env())?;
//!     let store = Arc::new(JsonMapStore::new(WorkerPool::with_cpu_count()?));
//!
//!     let manager = RuntimeManager::builder()
//!         .config(config)
//!         .store(store)
//!         .build()?;
//!
//!     let app = mapkeeper::controller::router(manager.clone());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!
//!     axum::serve(listener, app)
//!         .with_graceful_shutdown(async move {
//!             shutdown_signal().await;
//!             manager.shutdown().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types
pub use common::ApiResponse;
pub use config::{ConfigService, RuntimeConfig};
pub use error::{MapkeeperError, Result};
pub use lifecycle::{LifecycleError, ManagerState, RuntimeManager, StartOutcome};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use mapkeeper::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{ApiResponse, StatusCode};
    pub use crate::config::{ConfigService, RuntimeConfig};
    pub use crate::discovery::{DirectoryScanner, FileCredentialReader};
    pub use crate::error::{MapkeeperError, Result};
    pub use crate::lifecycle::{
        Credential, CredentialReader, DescriptorSource, LifecycleError, ManagerState,
        MapDescriptor, MapStore, RuntimeManager, RuntimeManagerBuilder, ShutdownHandler,
        StartOutcome, shutdown_signal,
    };
    pub use crate::store::{JsonMapStore, MapView};
    pub use crate::worker::WorkerPool;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
