//! 计算机账户资源

use std::sync::Arc;

use adldap_directory::{Account, AccountClass, AccountControl, AttributeMap};

use crate::error::{ResourceError, ResourceResult};
use crate::services::{ProviderContext, container_of, found, reconcile_service_principals};
use crate::types::{ComputerConfig, ComputerState};
use crate::validation::{parse_dn, require, validate_spns};

const DESCRIPTION: &str = "description";

/// Computer-account handler. The resource id is the sAMAccountName (with `$`).
pub struct ComputerService {
    ctx: Arc<ProviderContext>,
}

impl ComputerService {
    #[must_use]
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// Create the account named `CN=<name without $>` in the container.
    pub async fn create(&self, config: &ComputerConfig) -> ResourceResult<ComputerState> {
        validate_name(&config.name)?;
        validate_spns(&config.service_principal_names)?;
        let container = parse_dn("container", &config.container)?;

        let mut attributes = AttributeMap::new();
        if let Some(description) = config.description.as_deref().filter(|d| !d.is_empty()) {
            attributes.insert(DESCRIPTION.to_string(), vec![description.to_string()]);
        }

        let mut account = self
            .ctx
            .client()
            .create_account(
                &config.name,
                &container,
                &attributes,
                AccountClass::Computer,
                AccountControl::NEW_COMPUTER,
            )
            .await?;
        reconcile_service_principals(&mut account, &[], &config.service_principal_names).await?;

        state_of(&config.name, &mut account).await
    }

    /// `None` when the account no longer exists.
    pub async fn read(&self, id: &str) -> ResourceResult<Option<ComputerState>> {
        let Some(mut account) = found(
            self.ctx
                .client()
                .get_account(id, AccountClass::Computer)
                .await,
        )?
        else {
            log::debug!("Computer \"{id}\" is gone");
            return Ok(None);
        };
        state_of(id, &mut account).await.map(Some)
    }

    /// Move to the declared container, then converge the description and SPNs.
    pub async fn update(
        &self,
        id: &str,
        previous: &ComputerConfig,
        desired: &ComputerConfig,
    ) -> ResourceResult<ComputerState> {
        if desired.name != id {
            return Err(ResourceError::Validation(format!(
                "name cannot change from \"{id}\" to \"{}\"; the computer must be replaced",
                desired.name
            )));
        }
        validate_spns(&desired.service_principal_names)?;
        let container = parse_dn("container", &desired.container)?;

        let mut account = self
            .ctx
            .client()
            .get_account(id, AccountClass::Computer)
            .await?;

        if !account.entry().parent_dn()?.eq_ignore_case(&container) {
            account.move_to(&container).await?;
        }

        let description = desired
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| vec![d.to_string()])
            .unwrap_or_default();
        account
            .entry_mut()
            .update_attribute(DESCRIPTION, description)
            .await?;

        reconcile_service_principals(
            &mut account,
            &previous.service_principal_names,
            &desired.service_principal_names,
        )
        .await?;

        state_of(id, &mut account).await
    }

    /// Delete the account if present.
    pub async fn delete(&self, id: &str) -> ResourceResult<()> {
        let Some(account) = found(
            self.ctx
                .client()
                .get_account(id, AccountClass::Computer)
                .await,
        )?
        else {
            log::debug!("Computer \"{id}\" already absent");
            return Ok(());
        };
        account.delete().await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> ResourceResult<()> {
    require("name", name)?;
    if name.len() < 2 || !name.ends_with('$') {
        return Err(ResourceError::Validation(format!(
            "computer name \"{name}\" must end with \"$\""
        )));
    }
    Ok(())
}

async fn state_of(id: &str, account: &mut Account) -> ResourceResult<ComputerState> {
    account
        .entry_mut()
        .ensure_loaded(&[DESCRIPTION, adldap_directory::account::SERVICE_PRINCIPAL_NAME])
        .await?;
    let description = account.entry_mut().attribute_value(DESCRIPTION).await?;

    Ok(ComputerState {
        id: id.to_string(),
        name: id.to_string(),
        distinguished_name: account.dn().to_string(),
        container: container_of(account)?,
        description,
        service_principal_names: account.service_principals().await?,
    })
}
