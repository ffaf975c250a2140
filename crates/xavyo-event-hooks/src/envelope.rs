//! Security event token envelope.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encoder::EventPayload;
use crate::error::EncodeError;

/// Subject identifier of a SET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectId {
    pub format: String,
    pub id: String,
}

impl SubjectId {
    /// Opaque identifier, used for internal user ids.
    pub fn opaque(id: impl Into<String>) -> Self {
        Self {
            format: "opaque".to_string(),
            id: id.into(),
        }
    }
}

/// Security event token carrying exactly one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEventToken {
    /// Issuer, qualified by tenant.
    pub iss: String,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Unique token identifier.
    pub jti: String,

    /// Correlation id of the request that caused the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rci: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<SubjectId>,

    /// Event URI to payload.
    pub events: BTreeMap<String, EventPayload>,
}

impl SecurityEventToken {
    /// The URI of the carried event.
    #[must_use]
    pub fn event_uri(&self) -> Option<&str> {
        self.events.keys().next().map(String::as_str)
    }

    /// The carried payload.
    #[must_use]
    pub fn payload(&self) -> Option<&EventPayload> {
        self.events.values().next()
    }

    /// Serialize the token to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(self).map_err(|e| EncodeError::Serialization(e.to_string()))
    }

    /// Parse a token and check it carries exactly one event.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EncodeError> {
        let token: Self =
            serde_json::from_slice(bytes).map_err(|e| EncodeError::Serialization(e.to_string()))?;
        if token.events.len() != 1 {
            return Err(EncodeError::InvalidField {
                field: "events".to_string(),
                reason: format!("expected exactly one event, found {}", token.events.len()),
            });
        }
        Ok(token)
    }
}

/// Issued-at source that never goes backwards.
///
/// Shared by every envelope built through one dispatcher so that tokens
/// issued later never carry an earlier `iat`, even if the wall clock steps back.
#[derive(Debug, Default)]
pub struct IssuedAtClock {
    last: AtomicI64,
}

impl IssuedAtClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch second, clamped to the last value handed out.
    pub fn now(&self) -> i64 {
        self.observe(Utc::now().timestamp())
    }

    fn observe(&self, wall: i64) -> i64 {
        let previous = self.last.fetch_max(wall, Ordering::AcqRel);
        previous.max(wall)
    }
}

/// Builds one fresh envelope per (event, profile).
#[derive(Debug, Clone)]
pub struct SetEnvelopeBuilder {
    issuer: String,
    clock: Arc<IssuedAtClock>,
    correlation_id: Option<String>,
    subject: Option<SubjectId>,
}

impl SetEnvelopeBuilder {
    pub fn new(issuer: impl Into<String>, clock: Arc<IssuedAtClock>) -> Self {
        Self {
            issuer: issuer.into(),
            clock,
            correlation_id: None,
            subject: None,
        }
    }

    #[must_use]
    pub fn correlation_id(mut self, correlation_id: Option<&str>) -> Self {
        self.correlation_id = correlation_id.map(str::to_string);
        self
    }

    #[must_use]
    pub fn subject(mut self, user_id: Option<&str>) -> Self {
        self.subject = user_id.map(SubjectId::opaque);
        self
    }

    /// Wrap a payload. `iat` and `jti` are fresh on every call.
    #[must_use]
    pub fn build(&self, payload: EventPayload, event_uri: &str) -> SecurityEventToken {
        let mut events = BTreeMap::new();
        events.insert(event_uri.to_string(), payload);

        SecurityEventToken {
            iss: self.issuer.clone(),
            iat: self.clock.now(),
            jti: Uuid::new_v4().to_string(),
            rci: self.correlation_id.clone(),
            sub_id: self.subject.clone(),
            events,
        }
    }
}
