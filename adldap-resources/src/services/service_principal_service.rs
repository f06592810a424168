//! 服务主体名称 (SPN) 资源

use std::sync::Arc;

use adldap_directory::{ANY_CLASS, Account, DirectoryObject};

use crate::error::{ResourceError, ResourceResult};
use crate::services::{ProviderContext, found};
use crate::types::{ServicePrincipalConfig, ServicePrincipalId, ServicePrincipalState};
use crate::validation::{require, validate_spn};

/// Membership of one SPN in a user's or computer's SPN set.
///
/// The resource id is `{spn}---{account}`.
pub struct ServicePrincipalService {
    ctx: Arc<ProviderContext>,
}

impl ServicePrincipalService {
    #[must_use]
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// Add the SPN; fails with `AlreadyHasValue` when the account already has it.
    pub async fn create(
        &self,
        config: &ServicePrincipalConfig,
    ) -> ResourceResult<ServicePrincipalState> {
        require("account", &config.account)?;
        validate_spn(&config.spn)?;

        let Some(mut account) = self.find_account(&config.account).await? else {
            return Err(adldap_directory::DirectoryError::NotFound {
                object_class: "user or computer".to_string(),
                name: config.account.clone(),
            }
            .into());
        };
        account.add_service_principal(&config.spn).await?;

        Ok(ServicePrincipalId::new(&config.spn, &config.account).into())
    }

    /// `None` when the account is gone or no longer has the SPN.
    pub async fn read(&self, id: &str) -> ResourceResult<Option<ServicePrincipalState>> {
        let id = ServicePrincipalId::parse(id)?;
        validate_spn(&id.spn)?;

        let Some(mut account) = self.find_account(&id.account).await? else {
            log::debug!("Account \"{}\" for SPN \"{}\" is gone", id.account, id.spn);
            return Ok(None);
        };
        if !account.has_service_principal(&id.spn).await? {
            log::debug!("SPN \"{}\" no longer set on \"{}\"", id.spn, id.account);
            return Ok(None);
        }
        Ok(Some(id.into()))
    }

    /// Remove the SPN; nothing is sent when it is already absent.
    pub async fn delete(&self, id: &str) -> ResourceResult<()> {
        let id = ServicePrincipalId::parse(id)?;
        let Some(mut account) = self.find_account(&id.account).await? else {
            log::debug!("Account \"{}\" for SPN \"{}\" already absent", id.account, id.spn);
            return Ok(());
        };
        account.remove_service_principal(&id.spn).await?;
        Ok(())
    }

    /// The user or computer named `name`, `None` when there is none.
    async fn find_account(&self, name: &str) -> ResourceResult<Option<Account>> {
        let lookup = self
            .ctx
            .client()
            .get_object_by_name(name, ANY_CLASS, &["objectClass"])
            .await;
        let Some(entry) = found(lookup)? else {
            return Ok(None);
        };
        match DirectoryObject::classify(entry).await? {
            DirectoryObject::Account(account) => Ok(Some(account)),
            other => Err(ResourceError::Validation(format!(
                "\"{}\" is not a user or computer account",
                other.dn()
            ))),
        }
    }
}
