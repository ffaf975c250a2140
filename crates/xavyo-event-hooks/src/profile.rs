//! Event profile model: versioned vocabularies of channels and event URIs.

use serde::{Deserialize, Serialize};

/// A versioned event vocabulary.
///
/// Profiles are read from the metadata provider and replaced as a whole on
/// reload; a dispatch only ever sees one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProfile {
    /// Profile name, which also selects the payload schema.
    #[serde(alias = "profile")]
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl EventProfile {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }
}

/// A group of related events sharing one URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default)]
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub events: Vec<ChannelEvent>,
}

impl Channel {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_event(
        mut self,
        event_key: impl Into<String>,
        event_uri: impl Into<String>,
    ) -> Self {
        self.events.push(ChannelEvent {
            event_key: event_key.into(),
            event_uri: event_uri.into(),
        });
        self
    }
}

/// One event of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEvent {
    pub event_key: String,
    pub event_uri: String,
}

/// Where a raw event lands in a profile's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub channel_uri: String,
    pub event_key: String,
}

impl EventMetadata {
    pub fn new(channel_uri: impl Into<String>, event_key: impl Into<String>) -> Self {
        Self {
            channel_uri: channel_uri.into(),
            event_key: event_key.into(),
        }
    }
}
