//! WSO2 payload encoder.

use xavyo_event_hooks::event::params;
use xavyo_event_hooks::{
    EncodeError, EventCategory, EventData, EventHookConfig, EventPayload, EventSchema, FlowName,
    PayloadEncoder,
};

use super::claims;
use super::payload::{
    Application, FailedStep, Group, Organization, Reason, User, UserClaim, UserStore,
    Wso2EventPayload,
};

const SCIM2_USERS_ENDPOINT: &str = "scim2/Users";
const DEFAULT_LOGIN_FAILURE: &str = "Authentication failed";
const DEFAULT_REGISTRATION_FAILURE: &str = "User registration failed";

/// Action reported for user creation and profile changes made in a flow.
fn resolve_action(flow: FlowName) -> Option<&'static str> {
    match flow {
        FlowName::ProfileUpdate => Some("UPDATE"),
        FlowName::UserRegistrationInviteWithPassword | FlowName::InvitedUserRegistration => {
            Some("INVITE")
        }
        FlowName::UserRegistration => Some("REGISTER"),
        FlowName::JitProvision => Some("JUST_IN_TIME"),
        FlowName::CredentialReset => None,
    }
}

/// Builds WSO2 payloads for every event category.
#[derive(Debug, Clone)]
pub struct Wso2PayloadEncoder {
    config: EventHookConfig,
}

impl Wso2PayloadEncoder {
    #[must_use]
    pub fn new(config: &EventHookConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn user_ref(&self, data: &EventData, user_id: &str) -> String {
        format!(
            "{}/{SCIM2_USERS_ENDPOINT}/{user_id}",
            self.config.issuer_for(data.tenant_domain())
        )
    }

    fn user_with_id(&self, data: &EventData, user_id: &str) -> User {
        User {
            id: Some(user_id.to_string()),
            reference: Some(self.user_ref(data, user_id)),
            ..User::default()
        }
    }

    /// The event's user, which must be identified.
    fn required_user(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<User, EncodeError> {
        let user_id = data.user_id().ok_or(EncodeError::MissingField {
            category,
            field: "user id",
        })?;
        Ok(self.user_with_id(data, user_id))
    }

    fn base(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<Wso2EventPayload, EncodeError> {
        let name = data
            .publish_tenant_domain(category)
            .ok_or(EncodeError::MissingField {
                category,
                field: "tenant domain",
            })?;
        let mut payload = Wso2EventPayload::new(Organization {
            id: data.tenant_id().map(str::to_string),
            name: name.to_string(),
        });
        payload.user_store = data.user_store_domain().map(UserStore::from_domain);
        Ok(payload)
    }

    fn credential_update(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::CredentialUpdate;
        let mut payload = self.base(category, data)?;
        let mut user = self.required_user(category, data)?;
        user.claims = username_claim(data).into_iter().collect();
        payload.user = Some(user);
        payload.initiator_type = initiator_type(data);
        Ok(payload)
    }

    fn login_success(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::LoginSuccess;
        let mut payload = self.base(category, data)?;
        let mut user = self.required_user(category, data)?;
        user.claims = username_claim(data).into_iter().collect();
        payload.user = Some(user);
        payload.application = application_from_context(data);
        payload.authentication_methods = data
            .authentication()
            .map(|ctx| ctx.authentication_methods.clone())
            .unwrap_or_default();
        Ok(payload)
    }

    fn login_failure(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let mut payload = self.base(EventCategory::LoginFailure, data)?;
        payload.user = data.user_id().map(|id| self.user_with_id(data, id));
        payload.application = application_from_context(data);

        let failed_step = data.authentication().map(|ctx| FailedStep {
            step: ctx.current_step,
            idp: ctx.current_idp.clone(),
            authenticator: ctx.current_authenticator.clone(),
        });
        payload.reason = Some(Reason {
            description: data
                .string_parameter(params::ERROR_MESSAGE)
                .unwrap_or(DEFAULT_LOGIN_FAILURE)
                .to_string(),
            code: data.string_parameter(params::ERROR_CODE).map(str::to_string),
            failed_step,
        });
        Ok(payload)
    }

    fn token_revoke(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::TokenRevoke;
        let mut payload = self.base(category, data)?;
        payload.user = Some(self.required_user(category, data)?);
        payload.initiator_type = initiator_type(data);
        payload.session_id = data.string_parameter(params::SESSION_ID).map(str::to_string);

        let client_id = data.string_parameter(params::CLIENT_ID);
        let app_name = data.string_parameter(params::APPLICATION_NAME);
        if client_id.is_some() || app_name.is_some() {
            payload.application = Some(Application {
                id: client_id.map(str::to_string),
                name: app_name.map(str::to_string),
            });
        }
        Ok(payload)
    }

    /// New users, whether added by an administrator or self registered.
    fn user_created(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<Wso2EventPayload, EncodeError> {
        let mut payload = self.base(category, data)?;
        let user_claims = data.claims(params::USER_CLAIMS)?;

        let user_id = data
            .user_id()
            .map(str::to_string)
            .or_else(|| claim_value(&user_claims, claims::USER_ID))
            .ok_or(EncodeError::MissingField {
                category,
                field: "user id",
            })?;

        let mut user = self.user_with_id(data, &user_id);
        user.claims = to_user_claims(user_claims, &[claims::USER_ID]);
        payload.user = Some(user);
        payload.initiator_type = initiator_type(data);
        payload.action = action(data);
        Ok(payload)
    }

    fn user_deleted(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::UserDeleted;
        let mut payload = self.base(category, data)?;
        let mut user = self.required_user(category, data)?;
        user.claims = username_claim(data)
            .into_iter()
            .chain(
                data.string_parameter(params::EMAIL_ADDRESS)
                    .map(|email| UserClaim {
                        uri: claims::EMAIL_ADDRESS.to_string(),
                        value: email.to_string(),
                    }),
            )
            .collect();
        payload.user = Some(user);
        payload.initiator_type = initiator_type(data);
        Ok(payload)
    }

    /// Lock, unlock, enable and disable.
    fn user_account(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<Wso2EventPayload, EncodeError> {
        let mut payload = self.base(category, data)?;
        let mut user = self.required_user(category, data)?;
        user.claims = data
            .string_parameter(params::EMAIL_ADDRESS)
            .map(|email| UserClaim {
                uri: claims::EMAIL_ADDRESS.to_string(),
                value: email.to_string(),
            })
            .into_iter()
            .collect();
        payload.user = Some(user);
        // Lock state changes are made by the account lock handler, not a person.
        if matches!(category, EventCategory::UserEnabled | EventCategory::UserDisabled) {
            payload.initiator_type = initiator_type(data);
        }
        Ok(payload)
    }

    fn user_profile_updated(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::UserProfileUpdated;
        let mut payload = self.base(category, data)?;
        let mut user = self.required_user(category, data)?;
        user.added_claims = to_user_claims(data.claims(params::USER_CLAIMS_ADDED)?, &[]);
        user.updated_claims = to_user_claims(data.claims(params::USER_CLAIMS_MODIFIED)?, &[]);
        user.removed_claims = to_user_claims(data.claims(params::USER_CLAIMS_DELETED)?, &[]);
        payload.user = Some(user);
        payload.initiator_type = initiator_type(data);
        payload.action = action(data);
        Ok(payload)
    }

    fn user_group_updated(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::UserGroupUpdated;
        let mut payload = self.base(category, data)?;
        let name = data
            .string_parameter(params::ROLE_NAME)
            .ok_or(EncodeError::MissingField {
                category,
                field: "group name",
            })?;

        payload.group = Some(Group {
            id: data.string_parameter(params::ROLE_ID).map(str::to_string),
            name: name.to_string(),
            added_users: group_members(data.string_list(params::NEW_USERS)?),
            removed_users: group_members(data.string_list(params::DELETED_USERS)?),
        });
        payload.initiator_type = initiator_type(data);
        Ok(payload)
    }

    fn registration_failure(&self, data: &EventData) -> Result<Wso2EventPayload, EncodeError> {
        let category = EventCategory::RegistrationFailure;
        let mut payload = self.base(category, data)?;
        let user_claims = data.claims(params::USER_CLAIMS)?;

        // A failed registration has no user id yet; the location claim
        // carries the SCIM location reserved for the user.
        let user_id = data.user_id().map(str::to_string).or_else(|| {
            claim_value(&user_claims, claims::LOCATION)
                .and_then(|location| location.rsplit('/').next().map(str::to_string))
                .filter(|id| !id.is_empty())
        });

        let mut user = match user_id {
            Some(id) => self.user_with_id(data, &id),
            None => User::default(),
        };
        user.claims = to_user_claims(user_claims, &[claims::LOCATION, claims::USER_ID]);
        payload.user = Some(user);
        payload.initiator_type = initiator_type(data);
        payload.action = action(data);
        payload.reason = Some(Reason {
            description: data
                .string_parameter(params::ERROR_MESSAGE)
                .unwrap_or(DEFAULT_REGISTRATION_FAILURE)
                .to_string(),
            code: data.string_parameter(params::ERROR_CODE).map(str::to_string),
            failed_step: None,
        });
        Ok(payload)
    }
}

impl PayloadEncoder for Wso2PayloadEncoder {
    fn schema(&self) -> EventSchema {
        EventSchema::Wso2
    }

    fn supports(&self, _category: EventCategory) -> bool {
        true
    }

    fn encode(
        &self,
        category: EventCategory,
        data: &EventData,
    ) -> Result<EventPayload, EncodeError> {
        let payload = match category {
            EventCategory::CredentialUpdate => self.credential_update(data)?,
            EventCategory::LoginSuccess => self.login_success(data)?,
            EventCategory::LoginFailure => self.login_failure(data)?,
            EventCategory::TokenRevoke => self.token_revoke(data)?,
            EventCategory::UserCreated | EventCategory::RegistrationSuccess => {
                self.user_created(category, data)?
            }
            EventCategory::UserDeleted => self.user_deleted(data)?,
            EventCategory::UserLocked
            | EventCategory::UserUnlocked
            | EventCategory::UserEnabled
            | EventCategory::UserDisabled => self.user_account(category, data)?,
            EventCategory::UserProfileUpdated => self.user_profile_updated(data)?,
            EventCategory::UserGroupUpdated => self.user_group_updated(data)?,
            EventCategory::RegistrationFailure => self.registration_failure(data)?,
        };
        EventPayload::from_serializable(&payload)
    }
}

/// Persona that started the flow. Unknown personas are left out.
fn initiator_type(data: &EventData) -> Option<String> {
    data.flow()
        .and_then(|flow| flow.initiating_persona().ok().flatten())
        .map(|persona| persona.as_str().to_string())
}

fn action(data: &EventData) -> Option<String> {
    data.flow()
        .and_then(|flow| flow.name().ok())
        .and_then(resolve_action)
        .map(str::to_string)
}

fn username_claim(data: &EventData) -> Option<UserClaim> {
    data.user_name().map(|name| UserClaim {
        uri: claims::USERNAME.to_string(),
        value: name.to_string(),
    })
}

fn application_from_context(data: &EventData) -> Option<Application> {
    data.authentication()
        .filter(|ctx| ctx.service_provider_id.is_some() || ctx.service_provider_name.is_some())
        .map(|ctx| Application {
            id: ctx.service_provider_id.clone(),
            name: ctx.service_provider_name.clone(),
        })
}

fn claim_value(pairs: &[(String, String)], uri: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(claim, _)| claim == uri)
        .map(|(_, value)| value.clone())
        .filter(|value| !value.is_empty())
}

fn to_user_claims(pairs: Vec<(String, String)>, exclude: &[&str]) -> Vec<UserClaim> {
    pairs
        .into_iter()
        .filter(|(uri, _)| !exclude.contains(&uri.as_str()))
        .map(|(uri, value)| UserClaim { uri, value })
        .collect()
}

/// Group members reported as domain qualified user names.
fn group_members(names: Vec<String>) -> Vec<User> {
    names
        .into_iter()
        .map(|qualified| {
            let name = qualified
                .split_once('/')
                .map_or(qualified.as_str(), |(_, name)| name)
                .to_string();
            User {
                claims: vec![UserClaim {
                    uri: claims::USERNAME.to_string(),
                    value: name,
                }],
                ..User::default()
            }
        })
        .collect()
}
