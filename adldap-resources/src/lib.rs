//! # adldap-resources
//!
//! Host-facing resource handlers for Active Directory objects, built on
//! [`adldap_directory`].
//!
//! | Resource | Handler | Id |
//! |----------|---------|----|
//! | Organizational unit | [`OrganizationalUnitService`] | the DN |
//! | User | [`UserService`] | sAMAccountName |
//! | Computer | [`ComputerService`] | sAMAccountName, with trailing `$` |
//! | Service principal | [`ServicePrincipalService`] | `{spn}---{account}` |
//!
//! Every handler offers `create`, `read` (returning `None` once the object is
//! gone), `delete` (succeeding when already gone) and, where the object can
//! change in place, `update`. Failures come back as [`ResourceError`], which the
//! host turns into a [`Diagnostic`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use adldap_resources::{
//!     OrganizationalUnitConfig, OrganizationalUnitService, ProviderConfig, ProviderContext,
//! };
//!
//! # async fn run() -> adldap_resources::ResourceResult<()> {
//! // ADLDAP_URL, ADLDAP_BIND_ACCOUNT, ADLDAP_BIND_PASSWORD, ADLDAP_SEARCH_BASE
//! let config = ProviderConfig::from_env()?;
//! let ctx = Arc::new(ProviderContext::connect(&config).await?);
//!
//! let ous = OrganizationalUnitService::new(ctx);
//! let state = ous
//!     .create(&OrganizationalUnitConfig::new("OU=Widgets,OU=Teams,DC=example,DC=com")
//!         .with_create_parents(true))
//!     .await?;
//! println!("created {}", state.id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod types;
pub mod validation;

pub use config::ProviderConfig;
pub use error::{Diagnostic, ResourceError, ResourceResult, Severity};
pub use services::{
    ComputerService, OrganizationalUnitService, ProviderContext, ServicePrincipalService,
    UserService,
};
pub use types::{
    ComputerConfig, ComputerState, OrganizationalUnitConfig, OrganizationalUnitState,
    ServicePrincipalConfig, ServicePrincipalId, ServicePrincipalState, UserConfig, UserState,
};
