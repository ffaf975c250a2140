//! # xavyo-event-hooks
//!
//! Event-hook dispatch engine for identity lifecycle events.
//!
//! Observes raw identity events (logins, credential changes, session
//! termination, user lifecycle, registration) and turns each into one
//! security event token per interested event profile.
//!
//! ## Features
//!
//! - **Classification**: Pure, flow-aware decisions on which events a handler takes
//! - **Multiple Profiles**: Independent versioned vocabularies active side by side
//! - **Isolation**: A failing or panicking profile never affects the others
//! - **Eligibility**: Publish switches plus system application, federation and
//!   passive authentication exclusions
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xavyo_event_hooks::{
//!     BroadcastPublisher, Dispatcher, EventHookConfig, HandlerRegistry,
//!     InMemoryMetadataProvider, PublishPolicy,
//! };
//!
//! let config = EventHookConfig::from_env()?;
//! let (publisher, receiver) = BroadcastPublisher::new(1024, PublishPolicy::enabled());
//! let dispatcher = Dispatcher::new(
//!     config,
//!     Arc::new(InMemoryMetadataProvider::new(profiles)),
//!     catalog,
//!     encoders,
//!     Arc::new(publisher),
//! );
//!
//! let registry = HandlerRegistry::with_default_handlers(Arc::new(dispatcher));
//! registry.fire(&event).await;
//! ```

pub mod catalog;
pub mod category;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod eligibility;
pub mod encoder;
pub mod envelope;
pub mod error;
pub mod event;
pub mod event_data;
pub mod handler;
pub mod profile;
pub mod providers;
pub mod publisher;

// Re-exports for convenience
pub use catalog::{EventProfileManager, ProfileCatalog};
pub use category::{EventCategory, EventSchema, EventUriPolicy};
pub use classifier::EventClassifier;
pub use config::{EventHookConfig, EventHookConfigBuilder};
pub use dispatcher::{DispatchReport, Dispatcher, ProfileOutcome, ProfileReport, SkipReason};
pub use eligibility::{EligibilityFilter, EligibilityGate, GateDecision, GateInput};
pub use encoder::{EncoderRegistry, EventPayload, PayloadEncoder};
pub use envelope::{SecurityEventToken, SetEnvelopeBuilder, SubjectId};
pub use error::{ClassificationError, EncodeError, EventHookError};
pub use event::{Flow, FlowName, IdentityContextProvider, InitiatingPersona, RawEvent};
pub use event_data::EventData;
pub use handler::{EventHook, EventHookHandler, HandlerRegistry};
pub use profile::{Channel, ChannelEvent, EventMetadata, EventProfile};
pub use providers::{FileMetadataProvider, InMemoryMetadataProvider, MetadataProvider};
pub use publisher::{
    BroadcastPublisher, EventPublisher, PublishContext, PublishPolicy, PublishedEvent,
    PublisherError,
};
