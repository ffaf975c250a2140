//! OpenID Continuous Access Evaluation Profile.

use serde::Serialize;
use xavyo_event_hooks::{
    EncodeError, EventCategory, EventData, EventPayload, EventSchema, InitiatingPersona,
    PayloadEncoder,
};

use crate::vocabulary::StaticVocabulary;

pub const CHANNEL_URI: &str = "https://schemas.openid.net/secevent/caep";

pub const PROFILE_VERSION: &str = "1.0";

/// Categories a CAEP profile represents.
pub const CATEGORIES: [EventCategory; 3] = [
    EventCategory::TokenRevoke,
    EventCategory::CredentialUpdate,
    EventCategory::LoginSuccess,
];

#[must_use]
pub fn vocabulary() -> StaticVocabulary {
    StaticVocabulary::new(EventSchema::Caep, PROFILE_VERSION).channel(
        "CAEP",
        CHANNEL_URI,
        &[
            ("session-revoked", &[EventCategory::TokenRevoke]),
            ("credential-change", &[EventCategory::CredentialUpdate]),
            ("session-established", &[EventCategory::LoginSuccess]),
        ],
    )
}

#[derive(Debug, Serialize)]
struct SessionRevoked {
    #[serde(skip_serializing_if = "Option::is_none")]
    initiating_entity: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct CredentialChange {
    credential_type: &'static str,
    change_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initiating_entity: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct SessionEstablished {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    amr: Vec<String>,
}

/// CAEP name of the party that started the flow.
fn initiating_entity(data: &EventData) -> Option<&'static str> {
    let persona = data.flow()?.initiating_persona().ok().flatten()?;
    Some(match persona {
        InitiatingPersona::Admin => "admin",
        InitiatingPersona::User => "user",
        InitiatingPersona::Application => "policy",
        InitiatingPersona::System => "system",
    })
}

/// Builds CAEP session and credential payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaepPayloadEncoder;

impl PayloadEncoder for CaepPayloadEncoder {
    fn schema(&self) -> EventSchema {
        EventSchema::Caep
    }

    fn supports(&self, category: EventCategory) -> bool {
        CATEGORIES.contains(&category)
    }

    fn encode(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<EventPayload, EncodeError> {
        // CAEP events describe the token subject.
        if data.user_id().is_none() {
            return Err(EncodeError::MissingField {
                category,
                field: "user id",
            });
        }

        match category {
            EventCategory::TokenRevoke => EventPayload::from_serializable(&SessionRevoked {
                initiating_entity: initiating_entity(data),
            }),
            EventCategory::CredentialUpdate => EventPayload::from_serializable(&CredentialChange {
                credential_type: "password",
                change_type: "update",
                initiating_entity: initiating_entity(data),
            }),
            EventCategory::LoginSuccess => EventPayload::from_serializable(&SessionEstablished {
                amr: data
                    .authentication()
                    .map(|ctx| ctx.authentication_methods.clone())
                    .unwrap_or_default(),
            }),
            other => Err(EncodeError::UnsupportedCategory(other)),
        }
    }
}
