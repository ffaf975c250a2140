//! # xavyo-event-profiles
//!
//! Built-in event profiles for the xavyo event-hook engine.
//!
//! Each profile pairs a channel vocabulary with a payload encoder:
//!
//! - **WSO2**: Every event category, with tenant, user store, SCIM user
//!   references and claim changes
//! - **CAEP**: Session revocation, credential change and session establishment
//! - **RISC**: Account purge, disable and enable
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xavyo_event_hooks::{Dispatcher, EventHookConfig, InMemoryMetadataProvider};
//! use xavyo_event_profiles::{builtin_catalog, builtin_encoders, builtin_profiles};
//!
//! let config = EventHookConfig::from_env()?;
//! let dispatcher = Dispatcher::new(
//!     config.clone(),
//!     Arc::new(InMemoryMetadataProvider::new(builtin_profiles())),
//!     builtin_catalog(),
//!     builtin_encoders(&config),
//!     publisher,
//! );
//! ```

pub mod caep;
pub mod risc;
pub mod vocabulary;
pub mod wso2;

use std::sync::Arc;

use xavyo_event_hooks::{EncoderRegistry, EventHookConfig, EventProfile, ProfileCatalog};

// Re-exports for convenience
pub use caep::CaepPayloadEncoder;
pub use risc::RiscPayloadEncoder;
pub use vocabulary::StaticVocabulary;
pub use wso2::Wso2PayloadEncoder;

/// Catalog with the WSO2, CAEP and RISC vocabularies.
#[must_use]
pub fn builtin_catalog() -> ProfileCatalog {
    ProfileCatalog::new()
        .with_manager(Arc::new(wso2::vocabulary()))
        .with_manager(Arc::new(caep::vocabulary()))
        .with_manager(Arc::new(risc::vocabulary()))
}

/// Encoders for the built-in schemas.
#[must_use]
pub fn builtin_encoders(config: &EventHookConfig) -> EncoderRegistry {
    let registry = EncoderRegistry::new()
        .with_encoder(Arc::new(Wso2PayloadEncoder::new(config)))
        .with_encoder(Arc::new(CaepPayloadEncoder))
        .with_encoder(Arc::new(RiscPayloadEncoder));
    tracing::debug!(
        target: "event_profiles",
        encoders = registry.len(),
        "Registered built-in payload encoders"
    );
    registry
}

/// Profile documents for the built-in vocabularies, as a metadata service
/// would serve them.
#[must_use]
pub fn builtin_profiles() -> Vec<EventProfile> {
    vec![
        wso2::vocabulary().to_profile(),
        caep::vocabulary().to_profile(),
        risc::vocabulary().to_profile(),
    ]
}
