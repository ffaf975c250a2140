//! Event classification.
//!
//! Classifiers are pure: they look at a raw event and its flow snapshot and
//! decide which category, if any, the event belongs to.

use crate::category::EventCategory;
use crate::error::ClassificationError;
use crate::event::{names, FlowName, RawEvent};

/// Decides whether a handler is interested in a raw event.
pub trait EventClassifier: Send + Sync {
    /// Name of the handler this classifier belongs to.
    fn handler_name(&self) -> &'static str;

    /// Classify an event.
    ///
    /// `Ok(None)` means the handler is not interested. An error means the
    /// event could not be classified at all.
    fn classify(&self, event: &RawEvent) -> Result<Option<EventCategory>, ClassificationError>;

    /// Boolean view of [`classify`](Self::classify) for the host event bus.
    ///
    /// Classification errors are logged and turn into `false`.
    fn can_handle(&self, event: &RawEvent) -> bool {
        match self.classify(event) {
            Ok(category) => category.is_some(),
            Err(e) => {
                tracing::warn!(
                    target: "webhook_dispatch",
                    handler = self.handler_name(),
                    event_name = %event.name(),
                    error = %e,
                    "Failed to classify event, declining"
                );
                false
            }
        }
    }
}

fn event_name(event: &RawEvent) -> Result<&str, ClassificationError> {
    let name = event.name();
    if name.trim().is_empty() {
        return Err(ClassificationError::MissingEventName);
    }
    Ok(name)
}

/// Flow name of the event, `None` when no flow was captured.
fn flow_name(event: &RawEvent) -> Result<Option<FlowName>, ClassificationError> {
    event.flow().map(|flow| flow.name()).transpose()
}

/// Authentication outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoginEventClassifier;

impl EventClassifier for LoginEventClassifier {
    fn handler_name(&self) -> &'static str {
        "LoginEventHook"
    }

    fn classify(&self, event: &RawEvent) -> Result<Option<EventCategory>, ClassificationError> {
        Ok(match event_name(event)? {
            names::AUTHENTICATION_SUCCESS => Some(EventCategory::LoginSuccess),
            names::AUTHENTICATION_STEP_FAILURE | names::AUTHENTICATION_FAILURE => {
                Some(EventCategory::LoginFailure)
            }
            _ => None,
        })
    }
}

/// Password changes.
///
/// A newly added password only counts when it completes a credential reset.
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialEventClassifier;

impl EventClassifier for CredentialEventClassifier {
    fn handler_name(&self) -> &'static str {
        "CredentialEventHook"
    }

    fn classify(&self, event: &RawEvent) -> Result<Option<EventCategory>, ClassificationError> {
        match event_name(event)? {
            names::POST_ADD_NEW_PASSWORD => Ok(match flow_name(event)? {
                Some(FlowName::CredentialReset) => Some(EventCategory::CredentialUpdate),
                _ => None,
            }),
            names::POST_UPDATE_CREDENTIAL_BY_SCIM => Ok(Some(EventCategory::CredentialUpdate)),
            _ => Ok(None),
        }
    }
}

/// Session termination, which revokes the session's tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokensEventClassifier;

impl EventClassifier for TokensEventClassifier {
    fn handler_name(&self) -> &'static str {
        "TokensEventHook"
    }

    fn classify(&self, event: &RawEvent) -> Result<Option<EventCategory>, ClassificationError> {
        Ok((event_name(event)? == names::SESSION_TERMINATE).then_some(EventCategory::TokenRevoke))
    }
}

/// User lifecycle operations.
///
/// Users added by a self-registration flow belong to the registration
/// handler instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserOperationEventClassifier;

impl EventClassifier for UserOperationEventClassifier {
    fn handler_name(&self) -> &'static str {
        "UserOperationEventHook"
    }

    fn classify(&self, event: &RawEvent) -> Result<Option<EventCategory>, ClassificationError> {
        Ok(match event_name(event)? {
            names::POST_ADD_USER => match flow_name(event)? {
                Some(flow) if flow.is_registration() => None,
                _ => Some(EventCategory::UserCreated),
            },
            names::POST_DELETE_USER => Some(EventCategory::UserDeleted),
            names::POST_LOCK_ACCOUNT => Some(EventCategory::UserLocked),
            names::POST_UNLOCK_ACCOUNT => Some(EventCategory::UserUnlocked),
            names::POST_ENABLE_ACCOUNT => Some(EventCategory::UserEnabled),
            names::POST_DISABLE_ACCOUNT => Some(EventCategory::UserDisabled),
            names::POST_SET_USER_CLAIM_VALUES_WITH_ID => Some(EventCategory::UserProfileUpdated),
            names::POST_UPDATE_USER_LIST_OF_ROLE => Some(EventCategory::UserGroupUpdated),
            _ => None,
        })
    }
}

/// Self-registration outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistrationEventClassifier;

impl EventClassifier for RegistrationEventClassifier {
    fn handler_name(&self) -> &'static str {
        "RegistrationEventHook"
    }

    fn classify(&self, event: &RawEvent) -> Result<Option<EventCategory>, ClassificationError> {
        match event_name(event)? {
            names::POST_ADD_USER => Ok(match flow_name(event)? {
                Some(flow) if flow.is_registration() => Some(EventCategory::RegistrationSuccess),
                _ => None,
            }),
            names::USER_REGISTRATION_FAILED => Ok(Some(EventCategory::RegistrationFailure)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Flow, InitiatingPersona};
    use serde_json::Map;

    fn raw(name: &str) -> RawEvent {
        RawEvent::new(name, Map::new())
    }

    fn with_flow(name: &str, flow: FlowName) -> RawEvent {
        raw(name).with_flow(Flow::new(flow, InitiatingPersona::User))
    }

    #[test]
    fn test_login_categories() {
        let c = LoginEventClassifier;
        assert_eq!(
            c.classify(&raw(names::AUTHENTICATION_SUCCESS)),
            Ok(Some(EventCategory::LoginSuccess))
        );
        assert_eq!(
            c.classify(&raw(names::AUTHENTICATION_STEP_FAILURE)),
            Ok(Some(EventCategory::LoginFailure))
        );
        assert_eq!(
            c.classify(&raw(names::AUTHENTICATION_FAILURE)),
            Ok(Some(EventCategory::LoginFailure))
        );
        assert!(!c.can_handle(&raw(names::SESSION_TERMINATE)));
    }

    #[test]
    fn test_new_password_requires_credential_reset_flow() {
        let c = CredentialEventClassifier;
        assert!(c.can_handle(&with_flow(names::POST_ADD_NEW_PASSWORD, FlowName::CredentialReset)));
        assert!(!c.can_handle(&with_flow(names::POST_ADD_NEW_PASSWORD, FlowName::ProfileUpdate)));
        assert!(!c.can_handle(&raw(names::POST_ADD_NEW_PASSWORD)));
        assert_eq!(
            c.classify(&raw(names::POST_UPDATE_CREDENTIAL_BY_SCIM)),
            Ok(Some(EventCategory::CredentialUpdate))
        );
    }

    #[test]
    fn test_unknown_flow_declines_with_reason() {
        let c = CredentialEventClassifier;
        let event =
            raw(names::POST_ADD_NEW_PASSWORD).with_flow(Flow::from_raw("ACCOUNT_MERGE", None));
        assert_eq!(
            c.classify(&event),
            Err(ClassificationError::UnknownFlow {
                flow: "ACCOUNT_MERGE".to_string()
            })
        );
        assert!(!c.can_handle(&event));
    }

    #[test]
    fn test_unknown_flow_ignored_for_ungated_events() {
        let event = raw(names::POST_UPDATE_CREDENTIAL_BY_SCIM)
            .with_flow(Flow::from_raw("ACCOUNT_MERGE", None));
        assert!(CredentialEventClassifier.can_handle(&event));
    }

    #[test]
    fn test_empty_name_is_an_error() {
        assert_eq!(
            TokensEventClassifier.classify(&raw("")),
            Err(ClassificationError::MissingEventName)
        );
        assert!(!TokensEventClassifier.can_handle(&raw(" ")));
    }

    #[test]
    fn test_add_user_splits_between_user_and_registration_handlers() {
        let users = UserOperationEventClassifier;
        let registration = RegistrationEventClassifier;

        let admin_created = raw(names::POST_ADD_USER);
        assert_eq!(users.classify(&admin_created), Ok(Some(EventCategory::UserCreated)));
        assert_eq!(registration.classify(&admin_created), Ok(None));

        for flow in [FlowName::UserRegistration, FlowName::InvitedUserRegistration] {
            let registered = with_flow(names::POST_ADD_USER, flow);
            assert_eq!(users.classify(&registered), Ok(None));
            assert_eq!(
                registration.classify(&registered),
                Ok(Some(EventCategory::RegistrationSuccess))
            );
        }

        let provisioned = with_flow(names::POST_ADD_USER, FlowName::JitProvision);
        assert_eq!(users.classify(&provisioned), Ok(Some(EventCategory::UserCreated)));
        assert_eq!(registration.classify(&provisioned), Ok(None));
    }

    #[test]
    fn test_user_operation_categories() {
        let c = UserOperationEventClassifier;
        let cases = [
            (names::POST_DELETE_USER, EventCategory::UserDeleted),
            (names::POST_LOCK_ACCOUNT, EventCategory::UserLocked),
            (names::POST_UNLOCK_ACCOUNT, EventCategory::UserUnlocked),
            (names::POST_ENABLE_ACCOUNT, EventCategory::UserEnabled),
            (names::POST_DISABLE_ACCOUNT, EventCategory::UserDisabled),
            (
                names::POST_SET_USER_CLAIM_VALUES_WITH_ID,
                EventCategory::UserProfileUpdated,
            ),
            (
                names::POST_UPDATE_USER_LIST_OF_ROLE,
                EventCategory::UserGroupUpdated,
            ),
        ];
        for (name, category) in cases {
            assert_eq!(c.classify(&raw(name)), Ok(Some(category)), "{name}");
        }
    }

    #[test]
    fn test_registration_failure() {
        assert_eq!(
            RegistrationEventClassifier.classify(&raw(names::USER_REGISTRATION_FAILED)),
            Ok(Some(EventCategory::RegistrationFailure))
        );
    }
}
