//! Raw identity events and the flow context they were fired in.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClassificationError;

/// Raw event names fired by the identity runtime.
pub mod names {
    pub const AUTHENTICATION_SUCCESS: &str = "AUTHENTICATION_SUCCESS";
    pub const AUTHENTICATION_STEP_FAILURE: &str = "AUTHENTICATION_STEP_FAILURE";
    pub const AUTHENTICATION_FAILURE: &str = "AUTHENTICATION_FAILURE";
    pub const SESSION_TERMINATE: &str = "SESSION_TERMINATE";
    pub const POST_ADD_NEW_PASSWORD: &str = "POST_ADD_NEW_PASSWORD";
    pub const POST_UPDATE_CREDENTIAL_BY_SCIM: &str = "POST_UPDATE_CREDENTIAL_BY_SCIM";
    pub const POST_ADD_USER: &str = "POST_ADD_USER";
    pub const POST_DELETE_USER: &str = "POST_DELETE_USER";
    pub const POST_LOCK_ACCOUNT: &str = "POST_LOCK_ACCOUNT";
    pub const POST_UNLOCK_ACCOUNT: &str = "POST_UNLOCK_ACCOUNT";
    pub const POST_ENABLE_ACCOUNT: &str = "POST_ENABLE_ACCOUNT";
    pub const POST_DISABLE_ACCOUNT: &str = "POST_DISABLE_ACCOUNT";
    pub const POST_SET_USER_CLAIM_VALUES_WITH_ID: &str = "POST_SET_USER_CLAIM_VALUES_WITH_ID";
    pub const POST_UPDATE_USER_LIST_OF_ROLE: &str = "POST_UPDATE_USER_LIST_OF_ROLE";
    pub const USER_REGISTRATION_FAILED: &str = "USER_REGISTRATION_FAILED";
}

/// Well-known raw event parameter names.
pub mod params {
    pub const TENANT_DOMAIN: &str = "TENANT_DOMAIN";
    pub const TENANT_ID: &str = "TENANT_ID";
    pub const USER_ID: &str = "USER_ID";
    pub const USER_NAME: &str = "USER_NAME";
    pub const USER_STORE_DOMAIN: &str = "USER_STORE_DOMAIN";
    pub const USER_CLAIMS: &str = "USER_CLAIMS";
    pub const USER_CLAIMS_ADDED: &str = "USER_CLAIMS_ADDED";
    pub const USER_CLAIMS_MODIFIED: &str = "USER_CLAIMS_MODIFIED";
    pub const USER_CLAIMS_DELETED: &str = "USER_CLAIMS_DELETED";
    pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
    pub const ROLE_NAME: &str = "ROLE_NAME";
    pub const ROLE_ID: &str = "ROLE_ID";
    pub const NEW_USERS: &str = "NEW_USERS";
    pub const DELETED_USERS: &str = "DELETED_USERS";
    pub const ERROR_MESSAGE: &str = "ERROR_MESSAGE";
    pub const ERROR_CODE: &str = "ERROR_CODE";
    pub const SESSION_ID: &str = "SESSION_ID";
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const APPLICATION_NAME: &str = "APPLICATION_NAME";
    pub const CORRELATION_ID: &str = "CORRELATION_ID";
    /// Serialized authentication context of login events.
    pub const CONTEXT: &str = "CONTEXT";
}

/// Business flows the identity runtime reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowName {
    CredentialReset,
    UserRegistration,
    UserRegistrationInviteWithPassword,
    InvitedUserRegistration,
    ProfileUpdate,
    JitProvision,
}

impl FlowName {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialReset => "CREDENTIAL_RESET",
            Self::UserRegistration => "USER_REGISTRATION",
            Self::UserRegistrationInviteWithPassword => "USER_REGISTRATION_INVITE_WITH_PASSWORD",
            Self::InvitedUserRegistration => "INVITED_USER_REGISTRATION",
            Self::ProfileUpdate => "PROFILE_UPDATE",
            Self::JitProvision => "JIT_PROVISION",
        }
    }

    /// Returns true for flows in which a user signs themselves up.
    #[must_use]
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::UserRegistration | Self::InvitedUserRegistration)
    }
}

impl FromStr for FlowName {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDENTIAL_RESET" => Ok(Self::CredentialReset),
            "USER_REGISTRATION" => Ok(Self::UserRegistration),
            "USER_REGISTRATION_INVITE_WITH_PASSWORD" => {
                Ok(Self::UserRegistrationInviteWithPassword)
            }
            "INVITED_USER_REGISTRATION" => Ok(Self::InvitedUserRegistration),
            "PROFILE_UPDATE" => Ok(Self::ProfileUpdate),
            "JIT_PROVISION" => Ok(Self::JitProvision),
            _ => Err(ClassificationError::UnknownFlow {
                flow: s.to_string(),
            }),
        }
    }
}

impl Display for FlowName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who started the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitiatingPersona {
    Admin,
    User,
    Application,
    System,
}

impl InitiatingPersona {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
            Self::Application => "APPLICATION",
            Self::System => "SYSTEM",
        }
    }
}

impl FromStr for InitiatingPersona {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            "APPLICATION" => Ok(Self::Application),
            "SYSTEM" => Ok(Self::System),
            _ => Err(ClassificationError::UnknownPersona {
                persona: s.to_string(),
            }),
        }
    }
}

/// Snapshot of the flow an event was fired in.
///
/// The host reports flows as plain strings; they are only interpreted when
/// classification or encoding asks for them, so an unknown flow surfaces as
/// a [`ClassificationError`] rather than failing event capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initiating_persona: Option<String>,
}

impl Flow {
    /// Create a flow from known values.
    #[must_use]
    pub fn new(name: FlowName, persona: InitiatingPersona) -> Self {
        Self {
            name: name.as_str().to_string(),
            initiating_persona: Some(persona.as_str().to_string()),
        }
    }

    /// Create a flow from the strings reported by the host.
    pub fn from_raw(name: impl Into<String>, persona: Option<String>) -> Self {
        Self {
            name: name.into(),
            initiating_persona: persona,
        }
    }

    /// The flow name as reported by the host.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.name
    }

    pub fn name(&self) -> Result<FlowName, ClassificationError> {
        self.name.parse()
    }

    pub fn initiating_persona(&self) -> Result<Option<InitiatingPersona>, ClassificationError> {
        self.initiating_persona
            .as_deref()
            .map(|persona| persona.parse::<InitiatingPersona>())
            .transpose()
    }
}

/// Read-only view of the identity runtime's request context.
pub trait IdentityContextProvider: Send + Sync {
    /// The flow of the current request, if any.
    fn current_flow(&self) -> Option<Flow>;
}

/// An identity event as fired by the runtime.
///
/// Immutable once captured; lives for one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    name: String,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flow: Option<Flow>,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
            flow: None,
        }
    }

    /// Capture an event together with the flow of the current request.
    pub fn capture(
        name: impl Into<String>,
        parameters: Map<String, Value>,
        context: &dyn IdentityContextProvider,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            flow: context.current_flow(),
        }
    }

    #[must_use]
    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = Some(flow);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    #[must_use]
    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }
}
