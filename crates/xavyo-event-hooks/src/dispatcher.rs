//! Event dispatch across all active profiles.
//!
//! For one classified event the dispatcher:
//! - extracts the event data once
//! - takes one snapshot of the active profiles
//! - runs the profile pipeline (lookup, eligibility, encoding, envelope,
//!   publish) for each profile in isolation
//!
//! A failure or panic in one profile is recorded in the report and never
//! reaches the other profiles.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use futures_util::FutureExt;

use crate::catalog::ProfileCatalog;
use crate::category::{EventCategory, EventUriPolicy};
use crate::config::EventHookConfig;
use crate::eligibility::{EligibilityDenial, EligibilityFilter, GateInput};
use crate::encoder::EncoderRegistry;
use crate::envelope::{IssuedAtClock, SetEnvelopeBuilder};
use crate::error::EventHookError;
use crate::event::RawEvent;
use crate::event_data::EventData;
use crate::profile::EventProfile;
use crate::providers::MetadataProvider;
use crate::publisher::{EventPublisher, PublishContext};

/// Why a profile did not publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No schema is registered for the profile name.
    UnsupportedSchema,
    /// The profile's vocabulary does not cover the event.
    NoEventMetadata,
    /// The profile has no channel with the resolved URI.
    NoChannel { channel_uri: String },
    /// The channel has no event URI and the category requires one.
    NoEventUri { event_key: String },
    /// An eligibility gate denied the profile.
    Ineligible(EligibilityDenial),
    /// No encoder exists for the schema and category.
    NoEncoder,
}

/// Result of running one profile's pipeline.
#[derive(Debug)]
pub enum ProfileOutcome {
    Published { event_uri: String },
    Skipped(SkipReason),
    Failed(EventHookError),
}

/// Outcome for one profile.
#[derive(Debug)]
pub struct ProfileReport {
    pub profile_name: String,
    pub profile_version: String,
    pub outcome: ProfileOutcome,
}

/// Per-profile outcomes of a dispatch, in completion order.
#[derive(Debug)]
pub struct DispatchReport {
    pub event_name: String,
    pub category: EventCategory,
    pub profiles: Vec<ProfileReport>,
}

impl DispatchReport {
    fn empty(event_name: &str, category: EventCategory) -> Self {
        Self {
            event_name: event_name.to_string(),
            category,
            profiles: Vec::new(),
        }
    }

    /// Number of profiles that published.
    #[must_use]
    pub fn published_count(&self) -> usize {
        self.published().count()
    }

    /// Names of the profiles that published.
    #[must_use]
    pub fn published_profiles(&self) -> Vec<&str> {
        self.published().map(|r| r.profile_name.as_str()).collect()
    }

    /// Profiles that failed, with their errors.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &EventHookError)> {
        self.profiles
            .iter()
            .filter_map(|r| match &r.outcome {
                ProfileOutcome::Failed(e) => Some((r.profile_name.as_str(), e)),
                _ => None,
            })
            .collect()
    }

    /// Skip reason recorded for a profile, if it was skipped.
    #[must_use]
    pub fn skip_reason(&self, profile_name: &str) -> Option<&SkipReason> {
        self.profiles
            .iter()
            .find(|r| r.profile_name == profile_name)
            .and_then(|r| match &r.outcome {
                ProfileOutcome::Skipped(reason) => Some(reason),
                _ => None,
            })
    }

    fn published(&self) -> impl Iterator<Item = &ProfileReport> {
        self.profiles
            .iter()
            .filter(|r| matches!(r.outcome, ProfileOutcome::Published { .. }))
    }
}

/// Orchestrates classification output into published tokens.
pub struct Dispatcher {
    config: EventHookConfig,
    metadata: Arc<dyn MetadataProvider>,
    catalog: ProfileCatalog,
    encoders: EncoderRegistry,
    publisher: Arc<dyn EventPublisher>,
    eligibility: EligibilityFilter,
    clock: Arc<IssuedAtClock>,
}

impl Dispatcher {
    /// Create a dispatcher with the standard eligibility chain.
    pub fn new(
        config: EventHookConfig,
        metadata: Arc<dyn MetadataProvider>,
        catalog: ProfileCatalog,
        encoders: EncoderRegistry,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let eligibility = EligibilityFilter::standard(&config, Arc::clone(&publisher));
        Self {
            config,
            metadata,
            catalog,
            encoders,
            publisher,
            eligibility,
            clock: Arc::new(IssuedAtClock::new()),
        }
    }

    /// Replace the eligibility chain.
    #[must_use]
    pub fn with_eligibility(mut self, eligibility: EligibilityFilter) -> Self {
        self.eligibility = eligibility;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EventHookConfig {
        &self.config
    }

    /// Dispatch a classified event to every active profile.
    ///
    /// Returns an error only when the whole event has to be dropped: the
    /// event data cannot be extracted or the profile catalog is unavailable.
    #[tracing::instrument(
        skip_all,
        fields(event_name = %event.name(), category = %category)
    )]
    pub async fn dispatch(
        &self,
        event: &RawEvent,
        category: EventCategory,
    ) -> Result<DispatchReport, EventHookError> {
        let data = EventData::from_raw_event(event)?;
        let profiles = self.metadata.list_active_profiles().await?;

        if profiles.is_empty() {
            tracing::debug!(
                target: "webhook_dispatch",
                event_name = %event.name(),
                "No active event profiles"
            );
            return Ok(DispatchReport::empty(event.name(), category));
        }

        let pipelines: Vec<_> = profiles
            .iter()
            .map(|profile| self.run_profile(event.name(), category, &data, profile))
            .collect();
        let reports: Vec<ProfileReport> = stream::iter(pipelines)
            .buffer_unordered(self.config.profile_concurrency)
            .collect()
            .await;

        Ok(DispatchReport {
            event_name: event.name().to_string(),
            category,
            profiles: reports,
        })
    }

    /// Run one profile's pipeline, turning errors and panics into outcomes.
    async fn run_profile(
        &self,
        event_name: &str,
        category: EventCategory,
        data: &EventData,
        profile: &EventProfile,
    ) -> ProfileReport {
        let pipeline = self.publish_to_profile(event_name, category, data, profile);
        let outcome = match AssertUnwindSafe(pipeline).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(
                    target: "webhook_dispatch",
                    event_name = %event_name,
                    profile = %profile.name,
                    error = %e,
                    "Failed to publish event for profile"
                );
                ProfileOutcome::Failed(e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    target: "webhook_dispatch",
                    event_name = %event_name,
                    profile = %profile.name,
                    panic = %message,
                    "Profile pipeline panicked"
                );
                ProfileOutcome::Failed(EventHookError::ProfilePanicked {
                    profile: profile.name.clone(),
                    message,
                })
            }
        };

        ProfileReport {
            profile_name: profile.name.clone(),
            profile_version: profile.version.clone(),
            outcome,
        }
    }

    async fn publish_to_profile(
        &self,
        event_name: &str,
        category: EventCategory,
        data: &EventData,
        profile: &EventProfile,
    ) -> Result<ProfileOutcome, EventHookError> {
        let skip = |reason: SkipReason| {
            tracing::debug!(
                target: "webhook_dispatch",
                event_name = %event_name,
                profile = %profile.name,
                reason = ?reason,
                "Skipping profile"
            );
            Ok(ProfileOutcome::Skipped(reason))
        };

        let Some(schema) = self.catalog.schema_of(profile) else {
            return skip(SkipReason::UnsupportedSchema);
        };
        let Some(metadata) = self.catalog.resolve(profile, event_name, category) else {
            return skip(SkipReason::NoEventMetadata);
        };
        let Some(channel) = self.catalog.find_channel(profile, &metadata) else {
            return skip(SkipReason::NoChannel {
                channel_uri: metadata.channel_uri,
            });
        };
        let event_uri = match (
            self.catalog.find_event_uri(channel, &metadata),
            category.event_uri_policy(),
        ) {
            (Some(uri), _) => uri,
            (None, EventUriPolicy::FallbackToChannel) => channel.uri.as_str(),
            (None, EventUriPolicy::RequireEventUri) => {
                return skip(SkipReason::NoEventUri {
                    event_key: metadata.event_key,
                });
            }
        };

        let context = PublishContext {
            tenant_domain: data.publish_tenant_domain(category).map(str::to_string),
            event_uri: channel.uri.clone(),
            profile_name: profile.name.clone(),
            profile_version: profile.version.clone(),
        };

        let input = GateInput {
            data,
            category,
            profile,
            context: &context,
        };
        if let Err(denial) = self.eligibility.evaluate(&input).await {
            return skip(SkipReason::Ineligible(denial));
        }

        let Some(encoder) = self.encoders.lookup(schema, category) else {
            return skip(SkipReason::NoEncoder);
        };
        let payload = encoder.encode(category, data)?;

        let token = SetEnvelopeBuilder::new(
            self.config.issuer_for(context.tenant_domain.as_deref()),
            Arc::clone(&self.clock),
        )
        .correlation_id(data.correlation_id())
        .subject(data.user_id())
        .build(payload, event_uri);
        let jti = token.jti.clone();

        self.publisher
            .publish(token, &context)
            .await
            .map_err(|e| EventHookError::PublishFailed {
                profile: profile.name.clone(),
                cause: e.to_string(),
            })?;

        tracing::info!(
            target: "webhook_dispatch",
            event_name = %event_name,
            profile = %profile.name,
            version = %profile.version,
            event_uri = %event_uri,
            jti = %jti,
            "Published security event"
        );

        Ok(ProfileOutcome::Published {
            event_uri: event_uri.to_string(),
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("encoders", &self.encoders)
            .field("eligibility", &self.eligibility)
            .finish_non_exhaustive()
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
