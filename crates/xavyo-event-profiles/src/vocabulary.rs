//! Static channel and event vocabularies.

use xavyo_event_hooks::{
    Channel, EventCategory, EventMetadata, EventProfile, EventProfileManager, EventSchema,
};

/// One event of a vocabulary channel and the categories it carries.
#[derive(Debug, Clone)]
struct VocabularyEvent {
    key: &'static str,
    categories: &'static [EventCategory],
}

#[derive(Debug, Clone)]
struct VocabularyChannel {
    name: &'static str,
    uri: String,
    events: Vec<VocabularyEvent>,
}

/// A fixed vocabulary: channels, their events, and the categories each
/// event represents.
///
/// Event URIs are `{channel uri}/event-type/{event key}`.
#[derive(Debug, Clone)]
pub struct StaticVocabulary {
    schema: EventSchema,
    version: &'static str,
    channels: Vec<VocabularyChannel>,
}

impl StaticVocabulary {
    #[must_use]
    pub fn new(schema: EventSchema, version: &'static str) -> Self {
        Self {
            schema,
            version,
            channels: Vec::new(),
        }
    }

    /// Add a channel with `(event key, categories)` entries.
    #[must_use]
    pub fn channel(
        mut self,
        name: &'static str,
        uri: impl Into<String>,
        events: &[(&'static str, &'static [EventCategory])],
    ) -> Self {
        self.channels.push(VocabularyChannel {
            name,
            uri: uri.into(),
            events: events
                .iter()
                .map(|&(key, categories)| VocabularyEvent { key, categories })
                .collect(),
        });
        self
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Event URI for an event key of a channel.
    #[must_use]
    pub fn event_uri(channel_uri: &str, key: &str) -> String {
        format!("{channel_uri}/event-type/{key}")
    }

    /// Categories this vocabulary has an event for.
    #[must_use]
    pub fn categories(&self) -> Vec<EventCategory> {
        let mut categories: Vec<EventCategory> = self
            .channels
            .iter()
            .flat_map(|c| c.events.iter())
            .flat_map(|e| e.categories.iter().copied())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// The profile document a metadata service would serve for this vocabulary.
    #[must_use]
    pub fn to_profile(&self) -> EventProfile {
        self.channels.iter().fold(
            EventProfile::new(self.schema.as_str(), self.version),
            |profile, channel| {
                let built = channel.events.iter().fold(
                    Channel::new(channel.name, channel.uri.clone()),
                    |built, event| {
                        built.with_event(event.key, Self::event_uri(&channel.uri, event.key))
                    },
                );
                profile.with_channel(built)
            },
        )
    }
}

impl EventProfileManager for StaticVocabulary {
    fn schema(&self) -> EventSchema {
        self.schema
    }

    fn resolve_event_metadata(
        &self,
        _event_name: &str,
        category: EventCategory,
    ) -> Option<EventMetadata> {
        self.channels.iter().find_map(|channel| {
            channel
                .events
                .iter()
                .find(|event| event.categories.contains(&category))
                .map(|event| EventMetadata::new(channel.uri.clone(), event.key))
        })
    }
}
