use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{MetadataProvider, ProfileSnapshot};
use crate::config::EventHookConfig;
use crate::error::EventHookError;
use crate::profile::EventProfile;

/// Profiles read from `*.json` documents in a directory.
///
/// The directory is read on every listing, so edits take effect on the next
/// dispatch. Files are loaded in file name order.
#[derive(Debug, Clone)]
pub struct FileMetadataProvider {
    dir: PathBuf,
}

impl FileMetadataProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a provider for the configured profile directory.
    pub fn from_config(config: &EventHookConfig) -> Result<Self, EventHookError> {
        config
            .profile_dir
            .as_ref()
            .map(|dir| Self::new(dir.clone()))
            .ok_or_else(|| EventHookError::ConfigMissing {
                var: "EVENT_HOOK_PROFILE_DIR".to_string(),
            })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn profile_paths(&self) -> Result<Vec<PathBuf>, EventHookError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| unavailable(&self.dir, &e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| unavailable(&self.dir, &e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn unavailable(path: &Path, cause: &dyn std::fmt::Display) -> EventHookError {
    EventHookError::CatalogUnavailable {
        cause: format!("{}: {cause}", path.display()),
    }
}

#[async_trait]
impl MetadataProvider for FileMetadataProvider {
    async fn list_active_profiles(&self) -> Result<ProfileSnapshot, EventHookError> {
        let mut profiles = Vec::new();
        for path in self.profile_paths().await? {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| unavailable(&path, &e))?;
            let profile: EventProfile =
                serde_json::from_slice(&bytes).map_err(|e| unavailable(&path, &e))?;
            tracing::debug!(
                target: "webhook_dispatch",
                profile = %profile.name,
                version = %profile.version,
                path = %path.display(),
                "Loaded event profile"
            );
            profiles.push(profile);
        }
        Ok(profiles.into())
    }
}
