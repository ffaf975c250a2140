//! Sources of active event profiles.

mod file;
mod in_memory;

pub use file::FileMetadataProvider;
pub use in_memory::InMemoryMetadataProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EventHookError;
use crate::profile::EventProfile;

/// Immutable view of the active profiles, taken once per dispatch.
pub type ProfileSnapshot = Arc<[EventProfile]>;

/// Supplies the currently active event profiles.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List the active profiles.
    ///
    /// An error means the catalog is unavailable and the dispatch is aborted.
    async fn list_active_profiles(&self) -> Result<ProfileSnapshot, EventHookError>;
}
