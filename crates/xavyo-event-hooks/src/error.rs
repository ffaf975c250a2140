//! Error types for the xavyo-event-hooks crate.

use thiserror::Error;

use crate::category::EventCategory;

/// Errors raised while classifying a raw event.
///
/// A classification error never reaches the host event bus: the handler
/// declines the event and the reason is logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// The raw event carried an empty name.
    #[error("Event name is missing")]
    MissingEventName,

    /// The flow snapshot names a flow this engine does not know.
    #[error("Unknown flow name: {flow}")]
    UnknownFlow { flow: String },

    /// The flow snapshot names an initiating persona this engine does not know.
    #[error("Unknown initiating persona: {persona}")]
    UnknownPersona { persona: String },
}

/// Errors raised by a payload encoder.
///
/// Encoding errors are local to one (event, profile) pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A field required by the category is absent from the event data.
    #[error("Missing {field} for {category} payload")]
    MissingField {
        category: EventCategory,
        field: &'static str,
    },

    /// A field is present but cannot be used.
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// The encoder does not produce payloads for this category.
    #[error("Category {0} is not supported by this encoder")]
    UnsupportedCategory(EventCategory),

    /// The payload could not be turned into JSON.
    #[error("Failed to serialize payload: {0}")]
    Serialization(String),
}

/// Errors that can occur while dispatching event hooks.
#[derive(Debug, Error)]
pub enum EventHookError {
    // Configuration errors (permanent)
    /// Required configuration variable is missing.
    #[error("Configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("Configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    /// Two handlers were registered under the same name.
    #[error("Handler already registered: {name}")]
    DuplicateHandler { name: String },

    // Whole-event errors
    /// Event data could not be extracted from the raw event.
    #[error("Failed to extract event data from {event_name}: {reason}")]
    DataExtraction { event_name: String, reason: String },

    /// The profile catalog could not be read.
    #[error("Event profile catalog unavailable: {cause}")]
    CatalogUnavailable { cause: String },

    // Per-profile errors
    /// The payload encoder failed.
    #[error("Payload encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    /// The publisher rejected or failed to deliver the token.
    #[error("Failed to publish to profile {profile}: {cause}")]
    PublishFailed { profile: String, cause: String },

    /// A profile pipeline panicked.
    #[error("Pipeline for profile {profile} panicked: {message}")]
    ProfilePanicked { profile: String, message: String },
}

impl EventHookError {
    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EventHookError::ConfigMissing { .. } | EventHookError::ConfigInvalid { .. }
        )
    }

    /// Returns true if the error only affects a single profile of a dispatch.
    #[must_use]
    pub fn is_profile_local(&self) -> bool {
        matches!(
            self,
            EventHookError::Encoding(_)
                | EventHookError::PublishFailed { .. }
                | EventHookError::ProfilePanicked { .. }
        )
    }
}
