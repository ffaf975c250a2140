//! Named event-hook handlers and the table the host event bus fires them from.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;

use crate::classifier::{
    CredentialEventClassifier, EventClassifier, LoginEventClassifier,
    RegistrationEventClassifier, TokensEventClassifier, UserOperationEventClassifier,
};
use crate::dispatcher::{panic_message, DispatchReport, Dispatcher};
use crate::error::EventHookError;
use crate::event::RawEvent;

/// A handler registered with the host event bus.
#[async_trait]
pub trait EventHookHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Returns true if the handler wants the event.
    fn can_handle(&self, event: &RawEvent) -> bool;

    /// Handle an event. Failures are logged, never returned.
    ///
    /// Returns the dispatch report, or `None` when the event was declined
    /// or dropped as a whole.
    async fn handle_event(&self, event: &RawEvent) -> Option<DispatchReport>;
}

/// A classifier bound to the shared dispatcher.
pub struct EventHook<C> {
    classifier: C,
    dispatcher: Arc<Dispatcher>,
}

impl<C: EventClassifier> EventHook<C> {
    pub fn new(classifier: C, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            classifier,
            dispatcher,
        }
    }
}

pub type LoginEventHook = EventHook<LoginEventClassifier>;
pub type CredentialEventHook = EventHook<CredentialEventClassifier>;
pub type TokensEventHook = EventHook<TokensEventClassifier>;
pub type UserOperationEventHook = EventHook<UserOperationEventClassifier>;
pub type RegistrationEventHook = EventHook<RegistrationEventClassifier>;

#[async_trait]
impl<C: EventClassifier> EventHookHandler for EventHook<C> {
    fn name(&self) -> &str {
        self.classifier.handler_name()
    }

    fn can_handle(&self, event: &RawEvent) -> bool {
        self.classifier.can_handle(event)
    }

    async fn handle_event(&self, event: &RawEvent) -> Option<DispatchReport> {
        let category = match self.classifier.classify(event) {
            Ok(Some(category)) => category,
            Ok(None) => {
                tracing::debug!(
                    target: "webhook_dispatch",
                    handler = self.name(),
                    event_name = %event.name(),
                    "Event not handled"
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    target: "webhook_dispatch",
                    handler = self.name(),
                    event_name = %event.name(),
                    error = %e,
                    "Failed to classify event, declining"
                );
                return None;
            }
        };

        let dispatch = AssertUnwindSafe(self.dispatcher.dispatch(event, category));
        match dispatch.catch_unwind().await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                tracing::warn!(
                    target: "webhook_dispatch",
                    handler = self.name(),
                    event_name = %event.name(),
                    category = %category,
                    error = %e,
                    "Dropped event"
                );
                None
            }
            Err(panic) => {
                tracing::error!(
                    target: "webhook_dispatch",
                    handler = self.name(),
                    event_name = %event.name(),
                    category = %category,
                    panic = %panic_message(panic.as_ref()),
                    "Dispatch panicked, dropped event"
                );
                None
            }
        }
    }
}

/// Host-side table of named handlers, in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn EventHookHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the five built-in handlers.
    pub fn with_default_handlers(dispatcher: Arc<Dispatcher>) -> Self {
        let handlers: Vec<Arc<dyn EventHookHandler>> = vec![
            Arc::new(LoginEventHook::new(LoginEventClassifier, Arc::clone(&dispatcher))),
            Arc::new(CredentialEventHook::new(
                CredentialEventClassifier,
                Arc::clone(&dispatcher),
            )),
            Arc::new(TokensEventHook::new(TokensEventClassifier, Arc::clone(&dispatcher))),
            Arc::new(UserOperationEventHook::new(
                UserOperationEventClassifier,
                Arc::clone(&dispatcher),
            )),
            Arc::new(RegistrationEventHook::new(
                RegistrationEventClassifier,
                dispatcher,
            )),
        ];
        Self { handlers }
    }

    /// Register a handler. Names must be unique.
    pub fn register(&mut self, handler: Arc<dyn EventHookHandler>) -> Result<(), EventHookError> {
        if self.get(handler.name()).is_some() {
            return Err(EventHookError::DuplicateHandler {
                name: handler.name().to_string(),
            });
        }
        self.handlers.push(handler);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn EventHookHandler>> {
        self.handlers.iter().find(|h| h.name() == name).cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Handlers interested in an event.
    #[must_use]
    pub fn handlers_for(&self, event: &RawEvent) -> Vec<Arc<dyn EventHookHandler>> {
        self.handlers
            .iter()
            .filter(|h| h.can_handle(event))
            .cloned()
            .collect()
    }

    /// Run every interested handler in registration order.
    pub async fn fire(&self, event: &RawEvent) -> Vec<(String, Option<DispatchReport>)> {
        let mut results = Vec::new();
        for handler in self.handlers_for(event) {
            let report = handler.handle_event(event).await;
            results.push((handler.name().to_string(), report));
        }
        results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
