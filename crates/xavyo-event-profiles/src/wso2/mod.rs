//! WSO2 identity server event schema.

mod encoder;
pub mod payload;

pub use encoder::Wso2PayloadEncoder;

use xavyo_event_hooks::{EventCategory, EventSchema};

use crate::vocabulary::StaticVocabulary;

/// Base of every WSO2 channel URI.
pub const SCHEMA_BASE: &str = "https://schemas.identity.wso2.org/events";

pub const PROFILE_VERSION: &str = "v1";

/// Local claim URIs the payloads refer to.
pub mod claims {
    pub const EMAIL_ADDRESS: &str = "http://wso2.org/claims/emailaddress";
    pub const USER_ID: &str = "http://wso2.org/claims/userid";
    pub const LOCATION: &str = "http://wso2.org/claims/location";
    pub const USERNAME: &str = "http://wso2.org/claims/username";
}

/// The WSO2 channel and event vocabulary.
#[must_use]
pub fn vocabulary() -> StaticVocabulary {
    use EventCategory as C;

    StaticVocabulary::new(EventSchema::Wso2, PROFILE_VERSION)
        .channel(
            "Login",
            format!("{SCHEMA_BASE}/login"),
            &[
                ("loginSuccess", &[C::LoginSuccess]),
                ("loginFailed", &[C::LoginFailure]),
            ],
        )
        .channel(
            "Credential",
            format!("{SCHEMA_BASE}/credential"),
            &[("credentialUpdated", &[C::CredentialUpdate])],
        )
        .channel(
            "Token",
            format!("{SCHEMA_BASE}/token"),
            &[("accessTokensRevoked", &[C::TokenRevoke])],
        )
        .channel(
            "User",
            format!("{SCHEMA_BASE}/user"),
            &[
                ("userCreated", &[C::UserCreated]),
                ("userDeleted", &[C::UserDeleted]),
                ("userAccountLocked", &[C::UserLocked]),
                ("userAccountUnlocked", &[C::UserUnlocked]),
                ("userEnabled", &[C::UserEnabled]),
                ("userDisabled", &[C::UserDisabled]),
                ("userProfileUpdated", &[C::UserProfileUpdated]),
            ],
        )
        .channel(
            "Group",
            format!("{SCHEMA_BASE}/group"),
            &[("userGroupUpdated", &[C::UserGroupUpdated])],
        )
        .channel(
            "Registration",
            format!("{SCHEMA_BASE}/registration"),
            &[
                ("registrationSuccess", &[C::RegistrationSuccess]),
                ("registrationFailed", &[C::RegistrationFailure]),
            ],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use xavyo_event_hooks::{EventMetadata, EventProfileManager};

    #[test]
    fn test_vocabulary_covers_every_category() {
        assert_eq!(vocabulary().categories(), EventCategory::ALL.to_vec());
    }

    #[test]
    fn test_token_revoke_metadata() {
        let metadata = vocabulary()
            .resolve_event_metadata("SESSION_TERMINATE", EventCategory::TokenRevoke)
            .unwrap();
        assert_eq!(
            metadata,
            EventMetadata::new(
                "https://schemas.identity.wso2.org/events/token",
                "accessTokensRevoked"
            )
        );
    }

    #[test]
    fn test_profile_event_uris() {
        let profile = vocabulary().to_profile();
        assert_eq!(profile.name, "WSO2");
        let token = profile
            .channels
            .iter()
            .find(|c| c.name == "Token")
            .unwrap();
        assert_eq!(
            token.events[0].event_uri,
            "https://schemas.identity.wso2.org/events/token/event-type/accessTokensRevoked"
        );
    }
}
