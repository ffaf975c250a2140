//! OpenID Risk Incident Sharing and Coordination.

use serde::Serialize;
use xavyo_event_hooks::{
    EncodeError, EventCategory, EventData, EventPayload, EventSchema, PayloadEncoder, SubjectId,
};

use crate::vocabulary::StaticVocabulary;

pub const CHANNEL_URI: &str = "https://schemas.openid.net/secevent/risc";

pub const PROFILE_VERSION: &str = "1.0";

/// Categories a RISC profile represents.
pub const CATEGORIES: [EventCategory; 5] = [
    EventCategory::UserDeleted,
    EventCategory::UserDisabled,
    EventCategory::UserLocked,
    EventCategory::UserEnabled,
    EventCategory::UserUnlocked,
];

#[must_use]
pub fn vocabulary() -> StaticVocabulary {
    StaticVocabulary::new(EventSchema::Risc, PROFILE_VERSION).channel(
        "RISC",
        CHANNEL_URI,
        &[
            ("account-purged", &[EventCategory::UserDeleted]),
            (
                "account-disabled",
                &[EventCategory::UserDisabled, EventCategory::UserLocked],
            ),
            (
                "account-enabled",
                &[EventCategory::UserEnabled, EventCategory::UserUnlocked],
            ),
        ],
    )
}

#[derive(Debug, Serialize)]
struct AccountEvent {
    subject: SubjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

/// Builds RISC account payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiscPayloadEncoder;

impl PayloadEncoder for RiscPayloadEncoder {
    fn schema(&self) -> EventSchema {
        EventSchema::Risc
    }

    fn supports(&self, category: EventCategory) -> bool {
        CATEGORIES.contains(&category)
    }

    fn encode(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<EventPayload, EncodeError> {
        if !self.supports(category) {
            return Err(EncodeError::UnsupportedCategory(category));
        }
        let user_id = data.user_id().ok_or(EncodeError::MissingField {
            category,
            field: "user id",
        })?;

        // A lock follows repeated failed sign-ins, the hijacking reason of RISC.
        let reason = (category == EventCategory::UserLocked).then_some("hijacking");

        EventPayload::from_serializable(&AccountEvent {
            subject: SubjectId::opaque(user_id),
            reason,
        })
    }
}
