//! Publish eligibility gates.
//!
//! Each gate is an independent yes/no decision. The filter runs them in
//! order and stops at the first denial.

use std::sync::Arc;

use async_trait::async_trait;

use crate::category::EventCategory;
use crate::config::EventHookConfig;
use crate::event_data::EventData;
use crate::profile::EventProfile;
use crate::publisher::{EventPublisher, PublishContext};

/// Everything a gate may look at.
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    pub data: &'a EventData,
    pub category: EventCategory,
    pub profile: &'a EventProfile,
    pub context: &'a PublishContext,
}

/// Outcome of a single gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(String),
}

/// A named publish-eligibility check.
#[async_trait]
pub trait EligibilityGate: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, input: &GateInput<'_>) -> GateDecision;
}

/// Why a profile was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityDenial {
    pub gate: &'static str,
    pub reason: String,
}

/// Skips silent (passive) authentication checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassiveAuthenticationGate;

#[async_trait]
impl EligibilityGate for PassiveAuthenticationGate {
    fn name(&self) -> &'static str {
        "passive_authentication"
    }

    async fn check(&self, input: &GateInput<'_>) -> GateDecision {
        if !input.category.is_login() {
            return GateDecision::Allow;
        }
        match input.data.authentication() {
            Some(ctx) if ctx.passive_authenticate => {
                GateDecision::Deny("passive authentication".to_string())
            }
            _ => GateDecision::Allow,
        }
    }
}

/// Skips logins to the platform's own system application.
#[derive(Debug, Clone)]
pub struct SystemApplicationGate {
    application: String,
}

impl SystemApplicationGate {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
        }
    }
}

#[async_trait]
impl EligibilityGate for SystemApplicationGate {
    fn name(&self) -> &'static str {
        "system_application"
    }

    async fn check(&self, input: &GateInput<'_>) -> GateDecision {
        if !input.category.is_login() {
            return GateDecision::Allow;
        }
        let application = input
            .data
            .authentication()
            .and_then(|ctx| ctx.service_provider_name.as_deref());
        if application == Some(self.application.as_str()) {
            GateDecision::Deny(format!("login to system application {}", self.application))
        } else {
            GateDecision::Allow
        }
    }
}

/// Skips logins of users federated in from a parent organization.
#[derive(Debug, Clone)]
pub struct FederationGate {
    organization_idp: String,
}

impl FederationGate {
    pub fn new(organization_idp: impl Into<String>) -> Self {
        Self {
            organization_idp: organization_idp.into(),
        }
    }
}

#[async_trait]
impl EligibilityGate for FederationGate {
    fn name(&self) -> &'static str {
        "organization_federation"
    }

    async fn check(&self, input: &GateInput<'_>) -> GateDecision {
        if !input.category.is_login() {
            return GateDecision::Allow;
        }
        let user = input
            .data
            .authentication()
            .and_then(|ctx| ctx.authenticated_user.as_ref());
        match user {
            Some(user)
                if user.federated_user
                    && user.federated_idp_name.as_deref() == Some(self.organization_idp.as_str()) =>
            {
                GateDecision::Deny("organization federated user".to_string())
            }
            _ => GateDecision::Allow,
        }
    }
}

/// Asks the publisher whether publishing is enabled for the context.
#[derive(Clone)]
pub struct PublishEnabledGate {
    publisher: Arc<dyn EventPublisher>,
}

impl PublishEnabledGate {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl EligibilityGate for PublishEnabledGate {
    fn name(&self) -> &'static str {
        "publish_enabled"
    }

    async fn check(&self, input: &GateInput<'_>) -> GateDecision {
        if self.publisher.can_handle(input.context).await {
            GateDecision::Allow
        } else {
            GateDecision::Deny("publishing disabled".to_string())
        }
    }
}

/// Ordered chain of gates.
#[derive(Clone, Default)]
pub struct EligibilityFilter {
    gates: Vec<Arc<dyn EligibilityGate>>,
}

impl EligibilityFilter {
    /// An empty filter that allows everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: local login checks first, the publisher last.
    pub fn standard(config: &EventHookConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::new()
            .with_gate(Arc::new(PassiveAuthenticationGate))
            .with_gate(Arc::new(SystemApplicationGate::new(
                config.system_application.clone(),
            )))
            .with_gate(Arc::new(FederationGate::new(config.organization_idp.clone())))
            .with_gate(Arc::new(PublishEnabledGate::new(publisher)))
    }

    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn EligibilityGate>) -> Self {
        self.gates.push(gate);
        self
    }

    /// Gate names in evaluation order.
    #[must_use]
    pub fn gate_names(&self) -> Vec<&'static str> {
        self.gates.iter().map(|gate| gate.name()).collect()
    }

    /// Run the gates, stopping at the first denial.
    pub async fn evaluate(&self, input: &GateInput<'_>) -> Result<(), EligibilityDenial> {
        for gate in &self.gates {
            if let GateDecision::Deny(reason) = gate.check(input).await {
                return Err(EligibilityDenial {
                    gate: gate.name(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for EligibilityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityFilter")
            .field("gates", &self.gate_names())
            .finish()
    }
}
