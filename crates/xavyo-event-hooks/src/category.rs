//! Event categories and payload schemas.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic category of a classified event.
///
/// A category is schema-agnostic: every profile decides for itself whether
/// and how it represents a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventCategory {
    CredentialUpdate,
    LoginSuccess,
    LoginFailure,
    TokenRevoke,
    UserCreated,
    UserDeleted,
    UserLocked,
    UserUnlocked,
    UserEnabled,
    UserDisabled,
    UserProfileUpdated,
    UserGroupUpdated,
    RegistrationSuccess,
    RegistrationFailure,
}

impl EventCategory {
    /// Every category, in declaration order.
    pub const ALL: [EventCategory; 14] = [
        Self::CredentialUpdate,
        Self::LoginSuccess,
        Self::LoginFailure,
        Self::TokenRevoke,
        Self::UserCreated,
        Self::UserDeleted,
        Self::UserLocked,
        Self::UserUnlocked,
        Self::UserEnabled,
        Self::UserDisabled,
        Self::UserProfileUpdated,
        Self::UserGroupUpdated,
        Self::RegistrationSuccess,
        Self::RegistrationFailure,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialUpdate => "credentialUpdate",
            Self::LoginSuccess => "loginSuccess",
            Self::LoginFailure => "loginFailure",
            Self::TokenRevoke => "tokenRevoke",
            Self::UserCreated => "userCreated",
            Self::UserDeleted => "userDeleted",
            Self::UserLocked => "userLocked",
            Self::UserUnlocked => "userUnlocked",
            Self::UserEnabled => "userEnabled",
            Self::UserDisabled => "userDisabled",
            Self::UserProfileUpdated => "userProfileUpdated",
            Self::UserGroupUpdated => "userGroupUpdated",
            Self::RegistrationSuccess => "registrationSuccess",
            Self::RegistrationFailure => "registrationFailure",
        }
    }

    /// Returns true for the categories produced by the login handler.
    #[must_use]
    pub fn is_login(&self) -> bool {
        matches!(self, Self::LoginSuccess | Self::LoginFailure)
    }

    /// How the envelope address is chosen when the profile's channel has no
    /// event matching this category.
    #[must_use]
    pub fn event_uri_policy(&self) -> EventUriPolicy {
        // One login channel carries both outcomes, so a channel-level
        // address cannot tell them apart.
        if self.is_login() {
            EventUriPolicy::RequireEventUri
        } else {
            EventUriPolicy::FallbackToChannel
        }
    }
}

impl Display for EventCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressing policy applied when a channel has no categorized event URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventUriPolicy {
    /// Skip the profile.
    RequireEventUri,
    /// Address the envelope with the channel URI.
    FallbackToChannel,
}

/// Payload schema family of an event profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventSchema {
    /// WSO2 identity server event schema.
    Wso2,
    /// OpenID Continuous Access Evaluation Profile.
    Caep,
    /// OpenID Risk Incident Sharing and Coordination.
    Risc,
}

impl EventSchema {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wso2 => "WSO2",
            Self::Caep => "CAEP",
            Self::Risc => "RISC",
        }
    }

    /// Resolve the schema from an event profile name.
    ///
    /// Returns `None` for profiles this engine has no schema for.
    #[must_use]
    pub fn from_profile_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl FromStr for EventSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WSO2" => Ok(Self::Wso2),
            "CAEP" => Ok(Self::Caep),
            "RISC" => Ok(Self::Risc),
            _ => Err(format!("Unknown event schema: {s}")),
        }
    }
}

impl Display for EventSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
