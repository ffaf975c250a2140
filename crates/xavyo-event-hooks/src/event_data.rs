//! Profile-agnostic extraction of everything an encoder may need.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::EventCategory;
use crate::error::{EncodeError, EventHookError};
use crate::event::{params, Flow, RawEvent};

/// User store assumed when a user name is not domain qualified.
pub const DEFAULT_USER_STORE_DOMAIN: &str = "PRIMARY";

/// Authentication context attached to login events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticationContext {
    pub context_identifier: Option<String>,
    /// Name of the application the user signed in to.
    pub service_provider_name: Option<String>,
    /// Client or resource identifier of that application.
    pub service_provider_id: Option<String>,
    pub tenant_domain: Option<String>,
    /// Tenant of the organization being accessed.
    pub login_tenant_domain: Option<String>,
    /// True for silent (prompt=none) checks with no interactive login.
    pub passive_authenticate: bool,
    pub current_step: Option<u32>,
    pub current_authenticator: Option<String>,
    pub current_idp: Option<String>,
    pub authentication_methods: Vec<String>,
    pub authenticated_user: Option<AuthenticatedUser>,
}

/// The principal an authentication context resolved to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticatedUser {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_store_domain: Option<String>,
    pub tenant_domain: Option<String>,
    pub federated_user: bool,
    pub federated_idp_name: Option<String>,
    pub accessing_organization: Option<String>,
    pub user_resident_organization: Option<String>,
}

/// Normalized view of a raw event.
///
/// Built once per dispatch and shared read-only across all profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    event_name: String,
    tenant_domain: Option<String>,
    tenant_id: Option<String>,
    user_id: Option<String>,
    user_name: Option<String>,
    user_store_domain: Option<String>,
    correlation_id: Option<String>,
    authentication: Option<AuthenticationContext>,
    flow: Option<Flow>,
    parameters: Map<String, Value>,
}

impl EventData {
    /// Extract event data from a raw event.
    ///
    /// Fails when a well-known parameter has the wrong shape, for example a
    /// non-string tenant domain or an authentication context that is not an
    /// object.
    pub fn from_raw_event(event: &RawEvent) -> Result<Self, EventHookError> {
        let fail = |reason: String| EventHookError::DataExtraction {
            event_name: event.name().to_string(),
            reason,
        };

        let parameters = event.parameters();
        let field = |key: &str| scalar_parameter(parameters, key).map_err(fail);

        let authentication = match parameters.get(params::CONTEXT) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<AuthenticationContext>(value.clone())
                    .map_err(|e| fail(format!("invalid {}: {e}", params::CONTEXT)))?,
            ),
        };
        let authenticated_user = authentication
            .as_ref()
            .and_then(|ctx| ctx.authenticated_user.as_ref());

        let tenant_domain = field(params::TENANT_DOMAIN)?.or_else(|| {
            authentication
                .as_ref()
                .and_then(|ctx| ctx.tenant_domain.clone())
        });

        let user_id = field(params::USER_ID)?
            .or_else(|| authenticated_user.and_then(|u| u.user_id.clone()));

        let qualified_name = field(params::USER_NAME)?
            .or_else(|| authenticated_user.and_then(|u| u.user_name.clone()));
        let explicit_store = field(params::USER_STORE_DOMAIN)?
            .or_else(|| authenticated_user.and_then(|u| u.user_store_domain.clone()));

        let (user_name, user_store_domain) = match qualified_name {
            Some(name) => {
                let (store, name) = split_domain_qualified(&name);
                let store = explicit_store
                    .or(store)
                    .unwrap_or_else(|| DEFAULT_USER_STORE_DOMAIN.to_string());
                (Some(name), Some(store))
            }
            None => (None, explicit_store),
        };

        Ok(Self {
            event_name: event.name().to_string(),
            tenant_domain,
            tenant_id: field(params::TENANT_ID)?,
            user_id,
            user_name,
            user_store_domain,
            correlation_id: field(params::CORRELATION_ID)?,
            authentication,
            flow: event.flow().cloned(),
            parameters: parameters.clone(),
        })
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    #[must_use]
    pub fn tenant_domain(&self) -> Option<&str> {
        self.tenant_domain.as_deref()
    }

    /// Tenant of the organization a login targeted, falling back to the
    /// event's own tenant.
    #[must_use]
    pub fn login_tenant_domain(&self) -> Option<&str> {
        self.authentication
            .as_ref()
            .and_then(|ctx| ctx.login_tenant_domain.as_deref())
            .or(self.tenant_domain())
    }

    /// Tenant an event of `category` is published for.
    #[must_use]
    pub fn publish_tenant_domain(&self, category: EventCategory) -> Option<&str> {
        if category.is_login() {
            self.login_tenant_domain()
        } else {
            self.tenant_domain()
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// User name with any user store prefix removed.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    #[must_use]
    pub fn user_store_domain(&self) -> Option<&str> {
        self.user_store_domain.as_deref()
    }

    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    #[must_use]
    pub fn authentication(&self) -> Option<&AuthenticationContext> {
        self.authentication.as_ref()
    }

    #[must_use]
    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }

    #[must_use]
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// A parameter as a string slice, if it is a JSON string.
    #[must_use]
    pub fn string_parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Read a `{claim uri: value}` object parameter.
    ///
    /// Multi-valued claims are joined with commas. A missing parameter yields
    /// no claims.
    pub fn claims(&self, key: &str) -> Result<Vec<(String, String)>, EncodeError> {
        let object = match self.parameters.get(key) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(object)) => object,
            Some(_) => {
                return Err(EncodeError::InvalidField {
                    field: key.to_string(),
                    reason: "expected an object of claims".to_string(),
                })
            }
        };

        let mut claims = Vec::with_capacity(object.len());
        for (uri, value) in object {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Array(values) => values
                    .iter()
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join(","),
                Value::Object(_) => {
                    return Err(EncodeError::InvalidField {
                        field: format!("{key}.{uri}"),
                        reason: "nested objects are not claim values".to_string(),
                    })
                }
                other => other.to_string(),
            };
            claims.push((uri.clone(), value));
        }
        Ok(claims)
    }

    /// Read a list-of-strings parameter. A missing parameter yields an empty list.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>, EncodeError> {
        match self.parameters.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| EncodeError::InvalidField {
                            field: key.to_string(),
                            reason: "expected a list of strings".to_string(),
                        })
                })
                .collect(),
            Some(_) => Err(EncodeError::InvalidField {
                field: key.to_string(),
                reason: "expected a list of strings".to_string(),
            }),
        }
    }
}

/// Read a scalar parameter as a string. Numbers are accepted for ids.
fn scalar_parameter(parameters: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match parameters.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(format!("{key} must be a string, got {other}")),
    }
}

/// Split `STORE/name` into its user store and name parts.
fn split_domain_qualified(name: &str) -> (Option<String>, String) {
    match name.split_once('/') {
        Some((store, rest)) if !store.is_empty() && !rest.is_empty() => {
            (Some(store.to_uppercase()), rest.to_string())
        }
        _ => (None, name.to_string()),
    }
}
