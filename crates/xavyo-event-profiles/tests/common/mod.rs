//! Common test utilities for xavyo-event-profiles integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use xavyo_event_hooks::{
    BroadcastPublisher, Dispatcher, EventHookConfig, HandlerRegistry, InMemoryMetadataProvider,
    MetadataProvider, PublishPolicy, PublishedEvent, RawEvent,
};
use xavyo_event_profiles::{builtin_catalog, builtin_encoders, builtin_profiles};

pub const TENANT_MYORG: &str = "myorg";
pub const TENANT_ID: &str = "12";
pub const USER_ID: &str = "22e46698-7fa7-4497-90fc-e12864e30b77";

pub const WSO2_TOKEN_REVOKED: &str =
    "https://schemas.identity.wso2.org/events/token/event-type/accessTokensRevoked";
pub const CAEP_SESSION_REVOKED: &str =
    "https://schemas.openid.net/secevent/caep/event-type/session-revoked";
pub const RISC_ACCOUNT_DISABLED: &str =
    "https://schemas.openid.net/secevent/risc/event-type/account-disabled";

/// Initialize tracing for a test, ignoring repeated calls.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

pub fn raw_event(name: &str, parameters: Value) -> RawEvent {
    let Value::Object(parameters) = parameters else {
        panic!("event parameters must be a JSON object");
    };
    RawEvent::new(name, parameters)
}

/// Everything a test needs to fire events and observe what was published.
pub struct Harness {
    pub registry: HandlerRegistry,
    pub publisher: BroadcastPublisher,
    pub receiver: broadcast::Receiver<PublishedEvent>,
}

impl Harness {
    /// Handlers over the built-in profiles, all of them active.
    pub fn builtin() -> Self {
        Self::with_provider(Arc::new(InMemoryMetadataProvider::new(builtin_profiles())))
    }

    pub fn with_provider(metadata: Arc<dyn MetadataProvider>) -> Self {
        let config = EventHookConfig::default();
        let (publisher, receiver) = BroadcastPublisher::new(64, PublishPolicy::enabled());
        let dispatcher = Dispatcher::new(
            config.clone(),
            metadata,
            builtin_catalog(),
            builtin_encoders(&config),
            Arc::new(publisher.clone()),
        );
        Self {
            registry: HandlerRegistry::with_default_handlers(Arc::new(dispatcher)),
            publisher,
            receiver,
        }
    }

    /// Drain everything published so far, sorted by profile name.
    pub fn published(&mut self) -> Vec<PublishedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events.sort_by(|a, b| a.context.profile_name.cmp(&b.context.profile_name));
        events
    }
}
