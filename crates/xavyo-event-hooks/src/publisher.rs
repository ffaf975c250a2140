//! Publisher collaborator and an in-process broadcast implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

use crate::envelope::SecurityEventToken;

/// Addressing information handed to the publisher with every token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishContext {
    pub tenant_domain: Option<String>,
    /// Channel URI the subscriber registered for.
    pub event_uri: String,
    pub profile_name: String,
    pub profile_version: String,
}

/// Errors reported by a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublisherError {
    /// Nobody is listening for published tokens.
    #[error("No active subscribers for published events")]
    NoSubscribers,

    /// The publisher refused the token.
    #[error("Publish rejected: {reason}")]
    Rejected { reason: String },

    /// Delivery to the transport failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Hands finished tokens to the delivery transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Returns true if publishing is enabled for this context.
    async fn can_handle(&self, context: &PublishContext) -> bool;

    /// Publish one token. No retry is expected from the caller.
    async fn publish(
        &self,
        token: SecurityEventToken,
        context: &PublishContext,
    ) -> Result<(), PublisherError>;
}

/// Per-tenant and per-profile publish switches.
#[derive(Debug, Clone)]
pub struct PublishPolicy {
    default_enabled: bool,
    tenants: HashMap<String, bool>,
    profiles: HashMap<(String, String), bool>,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self::enabled()
    }
}

impl PublishPolicy {
    /// Publish everything unless overridden.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            default_enabled: true,
            tenants: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    /// Publish nothing unless overridden.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            default_enabled: false,
            ..Self::enabled()
        }
    }

    pub fn set_tenant(&mut self, tenant: impl Into<String>, enabled: bool) {
        self.tenants.insert(tenant.into(), enabled);
    }

    pub fn set_profile(
        &mut self,
        tenant: impl Into<String>,
        profile: impl Into<String>,
        enabled: bool,
    ) {
        self.profiles.insert((tenant.into(), profile.into()), enabled);
    }

    /// Most specific switch wins: tenant and profile, then tenant, then default.
    #[must_use]
    pub fn is_enabled(&self, context: &PublishContext) -> bool {
        let tenant = context.tenant_domain.clone().unwrap_or_default();
        if let Some(enabled) = self
            .profiles
            .get(&(tenant.clone(), context.profile_name.clone()))
        {
            return *enabled;
        }
        self.tenants
            .get(&tenant)
            .copied()
            .unwrap_or(self.default_enabled)
    }
}

/// A token together with the context it was published for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub token: SecurityEventToken,
    pub context: PublishContext,
}

/// Publisher that forwards tokens to a broadcast channel.
///
/// A transport worker subscribes to the channel and performs delivery.
#[derive(Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<PublishedEvent>,
    policy: Arc<RwLock<PublishPolicy>>,
}

impl BroadcastPublisher {
    /// Create a new publisher with the given channel capacity.
    pub fn new(
        capacity: usize,
        policy: PublishPolicy,
    ) -> (Self, broadcast::Receiver<PublishedEvent>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (
            Self {
                sender,
                policy: Arc::new(RwLock::new(policy)),
            },
            receiver,
        )
    }

    /// Get a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Replace the publish policy.
    pub async fn set_policy(&self, policy: PublishPolicy) {
        *self.policy.write().await = policy;
    }

    /// Toggle publishing for one profile of a tenant.
    pub async fn set_profile_enabled(&self, tenant: &str, profile: &str, enabled: bool) {
        self.policy.write().await.set_profile(tenant, profile, enabled);
    }
}

impl std::fmt::Debug for BroadcastPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastPublisher")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn can_handle(&self, context: &PublishContext) -> bool {
        self.policy.read().await.is_enabled(context)
    }

    async fn publish(
        &self,
        token: SecurityEventToken,
        context: &PublishContext,
    ) -> Result<(), PublisherError> {
        let event = PublishedEvent {
            token,
            context: context.clone(),
        };
        self.sender.send(event).map(|_| ()).map_err(|e| {
            tracing::warn!(
                target: "webhook_dispatch",
                profile = %context.profile_name,
                error = %e,
                "No active subscribers to receive security event"
            );
            PublisherError::NoSubscribers
        })
    }
}
