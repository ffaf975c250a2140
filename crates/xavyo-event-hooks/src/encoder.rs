//! Payload encoders and the registry that selects them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::category::{EventCategory, EventSchema};
use crate::error::EncodeError;
use crate::event_data::EventData;

/// Schema-specific event payload.
///
/// The dispatcher treats payloads as opaque; only encoders and subscribers
/// look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventPayload(serde_json::Value);

impl EventPayload {
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Serialize a typed payload structure.
    pub fn from_serializable<T: Serialize>(payload: &T) -> Result<Self, EncodeError> {
        serde_json::to_value(payload)
            .map(Self)
            .map_err(|e| EncodeError::Serialization(e.to_string()))
    }

    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// Builds payloads of one schema.
pub trait PayloadEncoder: Send + Sync {
    fn schema(&self) -> EventSchema;

    /// Returns true if the encoder produces payloads for `category`.
    fn supports(&self, category: EventCategory) -> bool;

    /// Build the payload for an event.
    ///
    /// Must not panic on missing data; report it as [`EncodeError`] instead.
    fn encode(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<EventPayload, EncodeError>;
}

/// Lookup table from (schema, category) to encoder, populated at startup.
#[derive(Clone, Default)]
pub struct EncoderRegistry {
    encoders: HashMap<(EventSchema, EventCategory), Arc<dyn PayloadEncoder>>,
}

impl EncoderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an encoder for every category it supports.
    pub fn register(&mut self, encoder: Arc<dyn PayloadEncoder>) {
        let schema = encoder.schema();
        for category in EventCategory::ALL {
            if encoder.supports(category) {
                self.encoders.insert((schema, category), Arc::clone(&encoder));
            }
        }
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn PayloadEncoder>) -> Self {
        self.register(encoder);
        self
    }

    #[must_use]
    pub fn lookup(
        &self,
        schema: EventSchema,
        category: EventCategory,
    ) -> Option<Arc<dyn PayloadEncoder>> {
        self.encoders.get(&(schema, category)).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.encoders.keys().collect();
        keys.sort();
        f.debug_struct("EncoderRegistry")
            .field("entries", &keys)
            .finish()
    }
}
