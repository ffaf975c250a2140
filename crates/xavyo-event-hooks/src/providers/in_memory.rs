use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MetadataProvider, ProfileSnapshot};
use crate::error::EventHookError;
use crate::profile::EventProfile;

/// Hot-reloadable in-memory profile set.
///
/// Reloads swap the whole snapshot; dispatches already holding the previous
/// snapshot keep it until they finish.
#[derive(Debug, Clone)]
pub struct InMemoryMetadataProvider {
    profiles: Arc<RwLock<ProfileSnapshot>>,
}

impl Default for InMemoryMetadataProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryMetadataProvider {
    #[must_use]
    pub fn new(profiles: Vec<EventProfile>) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(profiles.into())),
        }
    }

    /// Replace the active profiles.
    pub async fn replace(&self, profiles: Vec<EventProfile>) {
        let snapshot: ProfileSnapshot = profiles.into();
        *self.profiles.write().await = snapshot;
        tracing::info!(
            target: "webhook_dispatch",
            "Event profile catalog reloaded"
        );
    }
}

#[async_trait]
impl MetadataProvider for InMemoryMetadataProvider {
    async fn list_active_profiles(&self) -> Result<ProfileSnapshot, EventHookError> {
        Ok(Arc::clone(&*self.profiles.read().await))
    }
}
