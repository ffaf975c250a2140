//! Event hook configuration management.

use std::env;
use std::path::PathBuf;

use crate::error::EventHookError;

const DEFAULT_SET_ISSUER: &str = "https://localhost:9443";
const DEFAULT_SUPER_TENANT: &str = "carbon.super";
const DEFAULT_SYSTEM_APPLICATION: &str = "Console";
const DEFAULT_ORGANIZATION_IDP: &str = "SSO";

/// Dispatch engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHookConfig {
    /// Base URL used as the SET issuer.
    pub set_issuer: String,
    /// Tenant served at the root issuer.
    pub super_tenant: String,
    /// Application whose logins are never published.
    pub system_application: String,
    /// Identity provider name that marks organization federation.
    pub organization_idp: String,
    /// Maximum number of profiles processed at once.
    pub profile_concurrency: usize,
    /// Directory holding event profile documents.
    pub profile_dir: Option<PathBuf>,
}

impl Default for EventHookConfig {
    fn default() -> Self {
        Self {
            set_issuer: DEFAULT_SET_ISSUER.to_string(),
            super_tenant: DEFAULT_SUPER_TENANT.to_string(),
            system_application: DEFAULT_SYSTEM_APPLICATION.to_string(),
            organization_idp: DEFAULT_ORGANIZATION_IDP.to_string(),
            profile_concurrency: 1,
            profile_dir: None,
        }
    }
}

impl EventHookConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `EVENT_HOOK_SET_ISSUER`: SET issuer base URL (default: "https://localhost:9443")
    /// - `EVENT_HOOK_SUPER_TENANT`: root tenant domain (default: "carbon.super")
    /// - `EVENT_HOOK_SYSTEM_APPLICATION`: system application name (default: "Console")
    /// - `EVENT_HOOK_ORGANIZATION_IDP`: organization federation IdP (default: "SSO")
    /// - `EVENT_HOOK_PROFILE_CONCURRENCY`: profile fan-out, at least 1 (default: 1)
    /// - `EVENT_HOOK_PROFILE_DIR`: directory of profile JSON files
    pub fn from_env() -> Result<Self, EventHookError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EventHookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(issuer) = lookup("EVENT_HOOK_SET_ISSUER") {
            builder = builder.set_issuer(issuer);
        }
        if let Some(tenant) = lookup("EVENT_HOOK_SUPER_TENANT") {
            builder = builder.super_tenant(tenant);
        }
        if let Some(app) = lookup("EVENT_HOOK_SYSTEM_APPLICATION") {
            builder = builder.system_application(app);
        }
        if let Some(idp) = lookup("EVENT_HOOK_ORGANIZATION_IDP") {
            builder = builder.organization_idp(idp);
        }
        if let Some(raw) = lookup("EVENT_HOOK_PROFILE_CONCURRENCY") {
            let concurrency = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| EventHookError::ConfigInvalid {
                    var: "EVENT_HOOK_PROFILE_CONCURRENCY".to_string(),
                    reason: format!("{raw}: {e}"),
                })?;
            builder = builder.profile_concurrency(concurrency);
        }
        if let Some(dir) = lookup("EVENT_HOOK_PROFILE_DIR") {
            builder = builder.profile_dir(dir);
        }

        builder.build()
    }

    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EventHookConfigBuilder {
        EventHookConfigBuilder::new()
    }

    /// Issuer for tokens of a tenant.
    ///
    /// The super tenant is served at the base URL; other tenants under `/t/{tenant}`.
    #[must_use]
    pub fn issuer_for(&self, tenant_domain: Option<&str>) -> String {
        let base = self.set_issuer.trim_end_matches('/');
        match tenant_domain {
            Some(tenant) if !tenant.is_empty() && tenant != self.super_tenant => {
                format!("{base}/t/{tenant}")
            }
            _ => base.to_string(),
        }
    }
}

/// Builder for `EventHookConfig`.
#[derive(Debug, Default)]
pub struct EventHookConfigBuilder {
    set_issuer: Option<String>,
    super_tenant: Option<String>,
    system_application: Option<String>,
    organization_idp: Option<String>,
    profile_concurrency: Option<usize>,
    profile_dir: Option<PathBuf>,
}

impl EventHookConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.set_issuer = Some(issuer.into());
        self
    }

    pub fn super_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.super_tenant = Some(tenant.into());
        self
    }

    pub fn system_application(mut self, name: impl Into<String>) -> Self {
        self.system_application = Some(name.into());
        self
    }

    pub fn organization_idp(mut self, name: impl Into<String>) -> Self {
        self.organization_idp = Some(name.into());
        self
    }

    #[must_use]
    pub fn profile_concurrency(mut self, concurrency: usize) -> Self {
        self.profile_concurrency = Some(concurrency);
        self
    }

    pub fn profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<EventHookConfig, EventHookError> {
        let defaults = EventHookConfig::default();

        let set_issuer = self.set_issuer.unwrap_or(defaults.set_issuer);
        if !(set_issuer.starts_with("https://") || set_issuer.starts_with("http://")) {
            return Err(EventHookError::ConfigInvalid {
                var: "EVENT_HOOK_SET_ISSUER".to_string(),
                reason: format!("Issuer must be an http(s) URL: {set_issuer}"),
            });
        }

        let profile_concurrency = self
            .profile_concurrency
            .unwrap_or(defaults.profile_concurrency);
        if profile_concurrency == 0 {
            return Err(EventHookError::ConfigInvalid {
                var: "EVENT_HOOK_PROFILE_CONCURRENCY".to_string(),
                reason: "Concurrency must be at least 1".to_string(),
            });
        }

        Ok(EventHookConfig {
            set_issuer,
            super_tenant: self.super_tenant.unwrap_or(defaults.super_tenant),
            system_application: self
                .system_application
                .unwrap_or(defaults.system_application),
            organization_idp: self.organization_idp.unwrap_or(defaults.organization_idp),
            profile_concurrency,
            profile_dir: self.profile_dir,
        })
    }
}
