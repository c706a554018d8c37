//! Lifecycle-specific error types

use std::path::PathBuf;
use thiserror::Error;

/// Outcomes of manager operations that did not produce a resource
///
/// Collaborator faults never escape the manager as-is; they are logged and
/// folded into one of these variants.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The credential artifact is missing or empty
    #[error("Not configured: credential file {} not found", path.display())]
    NotConfigured {
        /// Where the credential was expected
        path: PathBuf,
    },

    /// Filesystem access around a load cycle failed
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// Scanning the base directory failed
    #[error("Discovery failed in {}: {message}", base_dir.display())]
    Discovery {
        /// Directory being scanned
        base_dir: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// A single descriptor could not be built
    #[error("Construction failed for {name}: {message}")]
    ConstructionFailed { name: String, message: String },

    /// Every descriptor failed, or none were found
    #[error("No maps loaded from {}", base_dir.display())]
    NoResourcesLoaded { base_dir: PathBuf },

    /// The requested map is absent or the manager is not running
    #[error("Map not found: {0}")]
    NotFound(String),

    /// No default map is available
    #[error("No default map available")]
    Unavailable,

    /// Releasing a map failed
    #[error("Teardown failed for {name}: {message}")]
    TeardownFailed { name: String, message: String },

    /// A collaborator call did not finish in time
    #[error("Timeout during {phase}: {message}")]
    Timeout {
        /// The lifecycle phase where timeout occurred
        phase: String,
        /// Additional error message
        message: String,
    },

    /// The manager was assembled without a required part
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
}

impl LifecycleError {
    /// Create an initialization failure error
    pub fn init_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a construction failure error
    pub fn construction_failed(name: impl Into<String>, message: impl ToString) -> Self {
        Self::ConstructionFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a teardown failure error
    pub fn teardown_failed(name: impl Into<String>, message: impl ToString) -> Self {
        Self::TeardownFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            phase: phase.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// True for outcomes a caller should surface as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
