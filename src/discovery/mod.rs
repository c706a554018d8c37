//! Filesystem collaborators
//!
//! Default [`DescriptorSource`] and [`CredentialReader`] used when the
//! runtime manager is built without overrides.

use crate::lifecycle::{
    Credential, CredentialReader, DescriptorSource, LifecycleError, MapDescriptor, Result,
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Lists files with a given extension directly inside a directory
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extension: String,
}

impl DirectoryScanner {
    /// `extension` is matched case-insensitively, with or without a leading dot
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    /// Registry name for a file, or `None` if it is not a descriptor
    pub fn descriptor_name(&self, file_name: &str) -> Option<String> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() || !ext.eq_ignore_ascii_case(&self.extension) {
            return None;
        }
        Some(stem.to_string())
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new("json")
    }
}

#[async_trait]
impl DescriptorSource for DirectoryScanner {
    async fn prepare(&self, base_dir: &Path) -> Result<()> {
        if fs::try_exists(base_dir)
            .await
            .map_err(|e| LifecycleError::io(base_dir, e))?
        {
            return Ok(());
        }
        fs::create_dir_all(base_dir)
            .await
            .map_err(|e| LifecycleError::io(base_dir, e))?;
        tracing::info!("Created directory: {}", base_dir.display());
        Ok(())
    }

    async fn discover(&self, base_dir: &Path) -> Result<Vec<MapDescriptor>> {
        let discovery_failed = |e: std::io::Error| LifecycleError::Discovery {
            base_dir: base_dir.to_path_buf(),
            message: e.to_string(),
        };

        let mut entries = fs::read_dir(base_dir).await.map_err(discovery_failed)?;
        let mut descriptors = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(discovery_failed)? {
            let file_type = entry.file_type().await.map_err(discovery_failed)?;
            if !file_type.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                tracing::debug!("Skipping non UTF-8 file name {:?}", file_name);
                continue;
            };
            if let Some(name) = self.descriptor_name(file_name) {
                descriptors.push(MapDescriptor::new(name, entry.path()));
            }
        }

        tracing::debug!(
            "Discovered {} descriptor(s) in {}",
            descriptors.len(),
            base_dir.display()
        );
        Ok(descriptors)
    }
}

/// Reads a credential from a text file, trimming whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCredentialReader;

#[async_trait]
impl CredentialReader for FileCredentialReader {
    async fn read(&self, path: &Path) -> Result<Option<Credential>> {
        match fs::read_to_string(path).await {
            Ok(secret) => Ok(Some(Credential::new(secret))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LifecycleError::io(path, e)),
        }
    }
}
