//! Profile catalog lookup.
//!
//! Maps a raw event onto a profile's vocabulary. Every lookup is a pure
//! function of its inputs and matches by exact string equality.

use std::collections::HashMap;
use std::sync::Arc;

use crate::category::{EventCategory, EventSchema};
use crate::profile::{Channel, EventMetadata, EventProfile};

/// Per-schema knowledge of which raw events a vocabulary covers.
pub trait EventProfileManager: Send + Sync {
    /// Schema this manager resolves for.
    fn schema(&self) -> EventSchema;

    /// Resolve the channel and event key for a raw event.
    ///
    /// Returns `None` when the vocabulary does not cover the event.
    fn resolve_event_metadata(
        &self,
        event_name: &str,
        category: EventCategory,
    ) -> Option<EventMetadata>;
}

/// Registry of profile managers keyed by schema.
#[derive(Clone, Default)]
pub struct ProfileCatalog {
    managers: HashMap<EventSchema, Arc<dyn EventProfileManager>>,
}

impl ProfileCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager, replacing any previous one for the same schema.
    #[must_use]
    pub fn with_manager(mut self, manager: Arc<dyn EventProfileManager>) -> Self {
        self.register(manager);
        self
    }

    pub fn register(&mut self, manager: Arc<dyn EventProfileManager>) {
        self.managers.insert(manager.schema(), manager);
    }

    /// Schema the profile's name maps to, if this catalog knows it.
    #[must_use]
    pub fn schema_of(&self, profile: &EventProfile) -> Option<EventSchema> {
        EventSchema::from_profile_name(&profile.name).filter(|s| self.managers.contains_key(s))
    }

    /// Resolve event metadata for a raw event within a profile.
    #[must_use]
    pub fn resolve(
        &self,
        profile: &EventProfile,
        event_name: &str,
        category: EventCategory,
    ) -> Option<EventMetadata> {
        let schema = self.schema_of(profile)?;
        self.managers
            .get(&schema)?
            .resolve_event_metadata(event_name, category)
    }

    /// Find the profile channel whose URI equals the metadata's channel URI.
    #[must_use]
    pub fn find_channel<'a>(
        &self,
        profile: &'a EventProfile,
        metadata: &EventMetadata,
    ) -> Option<&'a Channel> {
        profile
            .channels
            .iter()
            .find(|channel| channel.uri == metadata.channel_uri)
    }

    /// Find the event URI registered under the metadata's event key.
    #[must_use]
    pub fn find_event_uri<'a>(
        &self,
        channel: &'a Channel,
        metadata: &EventMetadata,
    ) -> Option<&'a str> {
        channel
            .events
            .iter()
            .find(|event| event.event_key == metadata.event_key)
            .map(|event| event.event_uri.as_str())
    }
}

impl std::fmt::Debug for ProfileCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemas: Vec<_> = self.managers.keys().collect();
        schemas.sort();
        f.debug_struct("ProfileCatalog")
            .field("schemas", &schemas)
            .finish()
    }
}
