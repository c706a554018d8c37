//! Map Lifecycle Module
//!
//! Keeps a set of expensive, named maps loaded only while somebody is
//! using them.
//!
//! # Lifecycle
//!
//! ```text
//!            ensure_started()
//! Stopped ───────────────────► Starting
//!    ▲                            │
//!    │   credential missing /     │ at least one map built
//!    │   nothing loaded           ▼
//!    ├──────────────────────── Running
//!    │                            │
//!    │   idle timeout exceeded    │
//!    │   or shutdown()            │
//!    └────────────────────────────┘
//! ```
//!
//! A single lock guards every state transition and the registry. The idle
//! checker is spawned on the first successful start and keeps running across
//! idle stops; `shutdown()` is the only thing that cancels it.
//!
//! # Example
//!
//! ```rust,ignore
//! use mapkeeper::lifecycle::{RuntimeManager, StartOutcome};
//!
//! let manager = RuntimeManager::builder()
//!     .config(config)
//!     .store(Arc::new(store))
//!     .build()?;
//!
//! // In a request handler
//! manager.note_activity();
//! if let Err(e) = manager.ensure_started().await {
//!     tracing::warn!("Maps unavailable: {}", e);
//! }
//! let names = manager.list_names().await;
//! ```

mod builder;
mod error;
mod idle;
mod manager;
mod registry;
mod shutdown;
mod traits;

pub use builder::RuntimeManagerBuilder;
pub use error::{LifecycleError, Result};
pub use manager::{ManagerState, RuntimeManager, StartOutcome};
pub use shutdown::{ShutdownHandler, shutdown_signal};
pub use traits::{Credential, CredentialReader, DescriptorSource, MapDescriptor, MapStore};
