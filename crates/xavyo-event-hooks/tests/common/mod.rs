//! Common test utilities for xavyo-event-hooks integration tests.
//!
//! Provides recording publishers, scripted encoders and profile fixtures for
//! exercising the dispatch pipeline without a real transport.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use xavyo_event_hooks::{
    Channel, Dispatcher, EncodeError, EncoderRegistry, EventCategory, EventData, EventHookConfig,
    EventMetadata, EventPayload, EventProfile, EventProfileManager, EventPublisher, EventSchema,
    InMemoryMetadataProvider, PayloadEncoder, ProfileCatalog, PublishContext, PublisherError,
    RawEvent, SecurityEventToken,
};

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

pub const TENANT_ACME: &str = "acme";
pub const USER_1: &str = "9f3c1b7e-4a1d-4b8e-9a55-2f6f0c1d7e01";

pub const LOGIN_CHANNEL: &str = "urn:test:login";
pub const LOGIN_SUCCESS_URI: &str = "urn:test:login:loginSuccess";
pub const LOGIN_FAILED_URI: &str = "urn:test:login:loginFailed";
pub const CREDENTIAL_CHANNEL: &str = "urn:test:credential";
pub const CREDENTIAL_UPDATED_URI: &str = "urn:test:credential:credentialUpdated";
pub const TOKEN_CHANNEL: &str = "urn:test:token";
pub const TOKEN_REVOKED_URI: &str = "urn:test:token:accessTokenRevoked";
pub const USER_CHANNEL: &str = "urn:test:user";

/// Initialize tracing for a test, ignoring repeated calls.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Build a raw event from a JSON object of parameters.
pub fn raw_event(name: &str, parameters: Value) -> RawEvent {
    let Value::Object(parameters) = parameters else {
        panic!("event parameters must be a JSON object");
    };
    RawEvent::new(name, parameters)
}

pub fn empty_event(name: &str) -> RawEvent {
    RawEvent::new(name, Map::new())
}

/// A profile with the full test vocabulary.
pub fn test_profile(name: &str) -> EventProfile {
    EventProfile::new(name, "v1")
        .with_channel(
            Channel::new("login", LOGIN_CHANNEL)
                .with_event("loginSuccess", LOGIN_SUCCESS_URI)
                .with_event("loginFailed", LOGIN_FAILED_URI),
        )
        .with_channel(
            Channel::new("credential", CREDENTIAL_CHANNEL)
                .with_event("credentialUpdated", CREDENTIAL_UPDATED_URI),
        )
        .with_channel(
            Channel::new("token", TOKEN_CHANNEL)
                .with_event("accessTokenRevoked", TOKEN_REVOKED_URI),
        )
        .with_channel(Channel::new("user", USER_CHANNEL))
}

// ---------------------------------------------------------------------------
// TableVocabulary - event name to metadata lookups
// ---------------------------------------------------------------------------

/// Vocabulary backed by a fixed table.
pub struct TableVocabulary {
    schema: EventSchema,
    table: HashMap<String, EventMetadata>,
}

impl TableVocabulary {
    /// The test vocabulary shared by every schema.
    pub fn standard(schema: EventSchema) -> Self {
        let entries = [
            ("AUTHENTICATION_SUCCESS", LOGIN_CHANNEL, "loginSuccess"),
            ("AUTHENTICATION_FAILURE", LOGIN_CHANNEL, "loginFailed"),
            ("AUTHENTICATION_STEP_FAILURE", LOGIN_CHANNEL, "loginFailed"),
            ("POST_ADD_NEW_PASSWORD", CREDENTIAL_CHANNEL, "credentialUpdated"),
            ("POST_UPDATE_CREDENTIAL_BY_SCIM", CREDENTIAL_CHANNEL, "credentialUpdated"),
            ("SESSION_TERMINATE", TOKEN_CHANNEL, "accessTokenRevoked"),
            ("POST_DELETE_USER", USER_CHANNEL, "userDeleted"),
        ];
        Self {
            schema,
            table: entries
                .into_iter()
                .map(|(name, channel, key)| (name.to_string(), EventMetadata::new(channel, key)))
                .collect(),
        }
    }
}

impl EventProfileManager for TableVocabulary {
    fn schema(&self) -> EventSchema {
        self.schema
    }

    fn resolve_event_metadata(
        &self,
        event_name: &str,
        _category: EventCategory,
    ) -> Option<EventMetadata> {
        self.table.get(event_name).cloned()
    }
}

/// Catalog knowing all three schemas with the test vocabulary.
pub fn test_catalog() -> ProfileCatalog {
    ProfileCatalog::new()
        .with_manager(Arc::new(TableVocabulary::standard(EventSchema::Wso2)))
        .with_manager(Arc::new(TableVocabulary::standard(EventSchema::Caep)))
        .with_manager(Arc::new(TableVocabulary::standard(EventSchema::Risc)))
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

/// What a scripted encoder does when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderBehavior {
    Succeed,
    Fail,
    Panic,
}

/// Encoder that counts calls and follows a script.
pub struct ScriptedEncoder {
    schema: EventSchema,
    categories: Vec<EventCategory>,
    behavior: EncoderBehavior,
    calls: AtomicUsize,
}

impl ScriptedEncoder {
    pub fn new(
        schema: EventSchema,
        categories: &[EventCategory],
        behavior: EncoderBehavior,
    ) -> Self {
        Self {
            schema,
            categories: categories.to_vec(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(schema: EventSchema, categories: &[EventCategory]) -> Arc<Self> {
        Arc::new(Self::new(schema, categories, EncoderBehavior::Succeed))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PayloadEncoder for ScriptedEncoder {
    fn schema(&self) -> EventSchema {
        self.schema
    }

    fn supports(&self, category: EventCategory) -> bool {
        self.categories.contains(&category)
    }

    fn encode(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<EventPayload, EncodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            EncoderBehavior::Succeed => Ok(EventPayload::new(json!({
                "schema": self.schema.as_str(),
                "category": category.as_str(),
                "tenant": data.tenant_domain(),
                "user": data.user_id(),
            }))),
            EncoderBehavior::Fail => Err(EncodeError::MissingField {
                category,
                field: "user id",
            }),
            EncoderBehavior::Panic => panic!("encoder for {} exploded", self.schema),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingPublisher - captures published tokens
// ---------------------------------------------------------------------------

/// A published token with its context.
#[derive(Debug, Clone)]
pub struct Published {
    pub token: SecurityEventToken,
    pub context: PublishContext,
}

/// Publisher that records everything it is given.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Published>>,
    disabled_profiles: HashSet<String>,
    failing_profiles: HashSet<String>,
    can_handle_calls: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publisher reporting publishing disabled for the given profiles.
    pub fn disabled_for(profiles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            disabled_profiles: profiles.iter().map(|p| (*p).to_string()).collect(),
            ..Self::default()
        })
    }

    /// Publisher failing every publish for the given profiles.
    pub fn failing_for(profiles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing_profiles: profiles.iter().map(|p| (*p).to_string()).collect(),
            ..Self::default()
        })
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .published()
            .into_iter()
            .map(|p| p.context.profile_name)
            .collect();
        names.sort();
        names
    }

    pub fn can_handle_calls(&self) -> usize {
        self.can_handle_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn can_handle(&self, context: &PublishContext) -> bool {
        self.can_handle_calls.fetch_add(1, Ordering::SeqCst);
        !self.disabled_profiles.contains(&context.profile_name)
    }

    async fn publish(
        &self,
        token: SecurityEventToken,
        context: &PublishContext,
    ) -> Result<(), PublisherError> {
        if self.failing_profiles.contains(&context.profile_name) {
            return Err(PublisherError::Transport("connection refused".to_string()));
        }
        self.published.lock().unwrap().push(Published {
            token,
            context: context.clone(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher assembly
// ---------------------------------------------------------------------------

pub fn encoders(list: Vec<Arc<ScriptedEncoder>>) -> EncoderRegistry {
    let mut registry = EncoderRegistry::new();
    for encoder in list {
        registry.register(encoder);
    }
    registry
}

/// Dispatcher over an in-memory catalog with the test vocabulary.
pub fn build_dispatcher(
    profiles: Vec<EventProfile>,
    encoders: EncoderRegistry,
    publisher: Arc<RecordingPublisher>,
) -> Dispatcher {
    dispatcher_with_config(EventHookConfig::default(), profiles, encoders, publisher)
}

pub fn dispatcher_with_config(
    config: EventHookConfig,
    profiles: Vec<EventProfile>,
    encoders: EncoderRegistry,
    publisher: Arc<RecordingPublisher>,
) -> Dispatcher {
    Dispatcher::new(
        config,
        Arc::new(InMemoryMetadataProvider::new(profiles)),
        test_catalog(),
        encoders,
        publisher,
    )
}
