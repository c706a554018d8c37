use dashmap::DashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const BASE_DIR_KEY: &str = "MAPKEEPER_BASE_DIR";
pub const CREDENTIAL_FILE_KEY: &str = "MAPKEEPER_CREDENTIAL_FILE";
pub const DESCRIPTOR_EXTENSION_KEY: &str = "MAPKEEPER_DESCRIPTOR_EXTENSION";
pub const IDLE_TIMEOUT_KEY: &str = "MAPKEEPER_IDLE_TIMEOUT_SECS";
pub const IDLE_CHECK_KEY: &str = "MAPKEEPER_IDLE_CHECK_SECS";
pub const CONSTRUCT_TIMEOUT_KEY: &str = "MAPKEEPER_CONSTRUCT_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({message})")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot of the process environment
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value, treating blank entries as absent
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                }),
            _ => Ok(None),
        }
    }

    fn get_secs(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        match self.get_parsed::<u64>(key)? {
            Some(0) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            }),
            other => Ok(other.map(Duration::from_secs)),
        }
    }
}

/// Settings consumed by the runtime manager and its default collaborators
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory holding the credential and the map descriptors
    pub base_dir: PathBuf,
    /// Credential file name, resolved against `base_dir`
    pub credential_file: String,
    /// Extension (without the dot) a file needs to count as a descriptor
    pub descriptor_extension: String,
    /// Inactivity after which every map is torn down
    pub idle_timeout: Duration,
    /// Period of the idle checker
    pub idle_check_interval: Duration,
    /// Upper bound on a single construction call
    pub construct_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("conf").join("mapkeeper"),
            credential_file: "encryption.key".to_string(),
            descriptor_extension: "json".to_string(),
            idle_timeout: Duration::from_secs(20),
            idle_check_interval: Duration::from_secs(30),
            construct_timeout: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_service(service: &ConfigService) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let base_dir = service
            .get(BASE_DIR_KEY)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.base_dir);
        let descriptor_extension = service
            .get_or(DESCRIPTOR_EXTENSION_KEY, &defaults.descriptor_extension)
            .trim_start_matches('.')
            .to_string();

        Ok(Self {
            base_dir,
            credential_file: service.get_or(CREDENTIAL_FILE_KEY, &defaults.credential_file),
            descriptor_extension,
            idle_timeout: service
                .get_secs(IDLE_TIMEOUT_KEY)?
                .unwrap_or(defaults.idle_timeout),
            idle_check_interval: service
                .get_secs(IDLE_CHECK_KEY)?
                .unwrap_or(defaults.idle_check_interval),
            construct_timeout: service.get_secs(CONSTRUCT_TIMEOUT_KEY)?,
        })
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_idle_check_interval(mut self, interval: Duration) -> Self {
        self.idle_check_interval = interval;
        self
    }

    pub fn with_construct_timeout(mut self, timeout: Duration) -> Self {
        self.construct_timeout = Some(timeout);
        self
    }

    pub fn credential_path(&self) -> PathBuf {
        self.base_dir.join(&self.credential_file)
    }
}
