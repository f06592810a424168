//! 资源处理服务层

mod computer_service;
mod organizational_unit_service;
mod service_principal_service;
mod user_service;

pub use computer_service::ComputerService;
pub use organizational_unit_service::OrganizationalUnitService;
pub use service_principal_service::ServicePrincipalService;
pub use user_service::UserService;

use std::collections::BTreeSet;

use adldap_directory::{Account, DirectoryClient, DirectoryError};

use crate::config::ProviderConfig;
use crate::error::ResourceResult;

/// 服务上下文 - 持有已绑定的目录客户端
///
/// Created once per provider configuration and shared by every handler.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    client: DirectoryClient,
}

impl ProviderContext {
    #[must_use]
    pub fn new(client: DirectoryClient) -> Self {
        Self { client }
    }

    /// Connect and bind with `config`; the search base is detected when unset.
    pub async fn connect(config: &ProviderConfig) -> ResourceResult<Self> {
        let mut config = config.clone();
        config.validate()?;
        for warning in config.warnings() {
            log::warn!("{}: {}", warning.summary, warning.detail);
        }
        let client = DirectoryClient::connect(&config.connection_settings()).await?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &DirectoryClient {
        &self.client
    }
}

/// Map a lookup miss to `None`.
pub(crate) fn found<T>(result: adldap_directory::Result<T>) -> ResourceResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DirectoryError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Bring the account's SPN set in line with `desired`.
///
/// Only values listed in `previous` are ever removed, so SPNs managed
/// elsewhere survive.
pub(crate) async fn reconcile_service_principals(
    account: &mut Account,
    previous: &[String],
    desired: &[String],
) -> ResourceResult<()> {
    let desired_set: BTreeSet<&str> = desired.iter().map(String::as_str).collect();
    let stale: Vec<&str> = previous
        .iter()
        .map(String::as_str)
        .filter(|spn| !desired_set.contains(spn))
        .collect();
    if !stale.is_empty() {
        account
            .entry_mut()
            .remove_attribute_values(adldap_directory::account::SERVICE_PRINCIPAL_NAME, &stale)
            .await?;
    }

    let current = account.service_principals().await?;
    let missing: Vec<&str> = desired_set
        .into_iter()
        .filter(|spn| !current.iter().any(|c| c == spn))
        .collect();
    if !missing.is_empty() {
        account
            .entry_mut()
            .add_attribute_values(adldap_directory::account::SERVICE_PRINCIPAL_NAME, &missing)
            .await?;
    }
    Ok(())
}

/// Parent DN text, empty for a single-component DN.
pub(crate) fn container_of(account: &Account) -> ResourceResult<String> {
    Ok(account.entry().parent_dn()?.to_string())
}
