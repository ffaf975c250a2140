//! Integration tests for the handler table and flow-gated classification.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use futures_util::FutureExt;
use serde_json::json;
use xavyo_event_hooks::classifier::TokensEventClassifier;
use xavyo_event_hooks::handler::TokensEventHook;
use xavyo_event_hooks::providers::ProfileSnapshot;
use xavyo_event_hooks::{
    Dispatcher, EventCategory, EventHookConfig, EventHookError, EventSchema, Flow, FlowName,
    HandlerRegistry, InitiatingPersona, MetadataProvider, RawEvent,
};

const ALL_HANDLERS: [&str; 5] = [
    "LoginEventHook",
    "CredentialEventHook",
    "TokensEventHook",
    "UserOperationEventHook",
    "RegistrationEventHook",
];

fn registry(publisher: Arc<RecordingPublisher>) -> HandlerRegistry {
    let dispatcher = build_dispatcher(
        vec![test_profile("WSO2")],
        encoders(vec![ScriptedEncoder::succeeding(
            EventSchema::Wso2,
            &EventCategory::ALL,
        )]),
        publisher,
    );
    HandlerRegistry::with_default_handlers(Arc::new(dispatcher))
}

fn interested(registry: &HandlerRegistry, event: &RawEvent) -> Vec<String> {
    registry
        .handlers_for(event)
        .iter()
        .map(|h| h.name().to_string())
        .collect()
}

#[test]
fn test_default_handlers_registered_in_order() {
    let registry = registry(RecordingPublisher::new());
    assert_eq!(registry.names(), ALL_HANDLERS.to_vec());
    assert_eq!(registry.len(), 5);
    assert!(registry.get("TokensEventHook").is_some());
    assert!(registry.get("AuditEventHook").is_none());
}

#[test]
fn test_duplicate_handler_rejected() {
    let publisher = RecordingPublisher::new();
    let mut registry = registry(publisher.clone());
    let dispatcher = Arc::new(build_dispatcher(Vec::new(), encoders(Vec::new()), publisher));

    let result = registry.register(Arc::new(TokensEventHook::new(
        TokensEventClassifier,
        dispatcher,
    )));

    match result {
        Err(EventHookError::DuplicateHandler { name }) => assert_eq!(name, "TokensEventHook"),
        other => panic!("Expected DuplicateHandler, got {other:?}"),
    }
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_unsupported_event_has_no_handler() {
    let registry = registry(RecordingPublisher::new());
    assert!(interested(&registry, &empty_event("POST_GET_USER")).is_empty());
    assert!(interested(&registry, &empty_event("")).is_empty());
}

#[test]
fn test_new_password_handled_only_in_credential_reset() {
    let registry = registry(RecordingPublisher::new());

    let reset = empty_event("POST_ADD_NEW_PASSWORD")
        .with_flow(Flow::new(FlowName::CredentialReset, InitiatingPersona::User));
    assert_eq!(interested(&registry, &reset), vec!["CredentialEventHook"]);

    let profile_update = empty_event("POST_ADD_NEW_PASSWORD")
        .with_flow(Flow::new(FlowName::ProfileUpdate, InitiatingPersona::Admin));
    assert!(interested(&registry, &profile_update).is_empty());

    assert!(interested(&registry, &empty_event("POST_ADD_NEW_PASSWORD")).is_empty());
}

#[test]
fn test_add_user_routed_by_flow() {
    let registry = registry(RecordingPublisher::new());

    let admin = empty_event("POST_ADD_USER");
    assert_eq!(interested(&registry, &admin), vec!["UserOperationEventHook"]);

    let self_signup = empty_event("POST_ADD_USER")
        .with_flow(Flow::new(FlowName::UserRegistration, InitiatingPersona::User));
    assert_eq!(interested(&registry, &self_signup), vec!["RegistrationEventHook"]);

    let unknown = empty_event("POST_ADD_USER").with_flow(Flow::from_raw("ACCOUNT_MERGE", None));
    assert!(interested(&registry, &unknown).is_empty());
}

#[tokio::test]
async fn test_fire_runs_interested_handlers_only() {
    init_test_logging();
    let publisher = RecordingPublisher::new();
    let registry = registry(publisher.clone());
    let event = raw_event(
        "SESSION_TERMINATE",
        json!({"TENANT_DOMAIN": TENANT_ACME, "USER_ID": USER_1}),
    );

    let results = registry.fire(&event).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "TokensEventHook");
    let report = results[0].1.as_ref().unwrap();
    assert_eq!(report.category, EventCategory::TokenRevoke);
    assert_eq!(report.published_count(), 1);
    assert_eq!(publisher.count(), 1);
}

#[tokio::test]
async fn test_handle_event_swallows_dispatch_errors() {
    init_test_logging();
    let publisher = RecordingPublisher::new();
    let registry = registry(publisher.clone());
    let handler = registry.get("TokensEventHook").unwrap();
    let malformed = raw_event("SESSION_TERMINATE", json!({"TENANT_DOMAIN": {"id": 1}}));

    assert!(handler.can_handle(&malformed));
    assert!(handler.handle_event(&malformed).await.is_none());
    assert_eq!(publisher.count(), 0);
}

#[tokio::test]
async fn test_handle_event_declines_unclassified_events() {
    let publisher = RecordingPublisher::new();
    let registry = registry(publisher.clone());
    let handler = registry.get("CredentialEventHook").unwrap();

    let without_flow = empty_event("POST_ADD_NEW_PASSWORD");
    assert!(handler.handle_event(&without_flow).await.is_none());

    let unknown_flow =
        empty_event("POST_ADD_NEW_PASSWORD").with_flow(Flow::from_raw("ACCOUNT_MERGE", None));
    assert!(handler.handle_event(&unknown_flow).await.is_none());
    assert_eq!(publisher.count(), 0);
}

#[tokio::test]
async fn test_credential_reset_publishes_credential_update() {
    let publisher = RecordingPublisher::new();
    let registry = registry(publisher.clone());
    let event = raw_event(
        "POST_ADD_NEW_PASSWORD",
        json!({"TENANT_DOMAIN": TENANT_ACME, "USER_ID": USER_1}),
    )
    .with_flow(Flow::new(FlowName::CredentialReset, InitiatingPersona::User));

    let results = registry.fire(&event).await;

    assert_eq!(results.len(), 1);
    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].token.event_uri(), Some(CREDENTIAL_UPDATED_URI));
    assert_eq!(published[0].context.event_uri, CREDENTIAL_CHANNEL);
}

struct PanickingProvider;

#[async_trait]
impl MetadataProvider for PanickingProvider {
    async fn list_active_profiles(&self) -> Result<ProfileSnapshot, EventHookError> {
        panic!("metadata client poisoned");
    }
}

#[tokio::test]
async fn test_fire_contains_dispatch_panic() {
    init_test_logging();
    let publisher = RecordingPublisher::new();
    let dispatcher = Dispatcher::new(
        EventHookConfig::default(),
        Arc::new(PanickingProvider),
        test_catalog(),
        encoders(vec![ScriptedEncoder::succeeding(
            EventSchema::Wso2,
            &EventCategory::ALL,
        )]),
        publisher.clone(),
    );
    let registry = HandlerRegistry::with_default_handlers(Arc::new(dispatcher));
    let event = raw_event(
        "SESSION_TERMINATE",
        json!({"TENANT_DOMAIN": TENANT_ACME, "USER_ID": USER_1}),
    );

    let fired = std::panic::AssertUnwindSafe(registry.fire(&event))
        .catch_unwind()
        .await;

    let results = fired.expect("panic must not reach the event bus");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "TokensEventHook");
    assert!(results[0].1.is_none());
    assert_eq!(publisher.count(), 0);
}
