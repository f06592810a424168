//! 用户账户资源

use std::collections::BTreeMap;
use std::sync::Arc;

use adldap_directory::{Account, AccountClass, AccountControl, AttributeMap};

use crate::error::{ResourceError, ResourceResult};
use crate::services::{ProviderContext, container_of, found, reconcile_service_principals};
use crate::types::{UserConfig, UserState};
use crate::validation::{parse_dn, require, validate_spns};

const DISPLAY_NAME: &str = "displayName";
const USER_PRINCIPAL_NAME: &str = "userPrincipalName";
const ACCOUNT_EXPIRES: &str = "accountExpires";

/// `accountExpires` value meaning "never".
const NEVER_EXPIRES: &str = "0";

/// User-account handler. The resource id is the sAMAccountName.
pub struct UserService {
    ctx: Arc<ProviderContext>,
}

impl UserService {
    #[must_use]
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// Create the account disabled, set its password, then apply the declared
    /// flags and service principals.
    ///
    /// Not transactional: a failure after the add leaves the disabled account
    /// in place.
    pub async fn create(&self, config: &UserConfig) -> ResourceResult<UserState> {
        require("sam_account_name", &config.sam_account_name)?;
        require("password", &config.password)?;
        validate_spns(&config.service_principal_names)?;
        let container = parse_dn("container", &config.container)?;

        let mut attributes: AttributeMap = config.attributes.clone();
        attributes.insert("name".to_string(), vec![config.common_name().to_string()]);
        attributes.insert(ACCOUNT_EXPIRES.to_string(), vec![NEVER_EXPIRES.to_string()]);
        if let Some(display_name) = non_empty(config.display_name.as_deref()) {
            attributes.insert(DISPLAY_NAME.to_string(), vec![display_name.to_string()]);
        }
        if let Some(upn) = non_empty(config.user_principal_name.as_deref()) {
            attributes.insert(USER_PRINCIPAL_NAME.to_string(), vec![upn.to_string()]);
        }

        let mut account = self
            .ctx
            .client()
            .create_account(
                &config.sam_account_name,
                &container,
                &attributes,
                AccountClass::User,
                AccountControl::NEW_USER,
            )
            .await?;

        account.set_password(&config.password).await?;
        if config.password_never_expires {
            account.set_password_never_expires(true).await?;
        }
        if config.enabled {
            account.enable().await?;
        }
        reconcile_service_principals(&mut account, &[], &config.service_principal_names).await?;

        let extra = extra_names(config);
        state_of(&config.sam_account_name, &mut account, &extra).await
    }

    /// `None` when the account no longer exists.
    pub async fn read(&self, id: &str) -> ResourceResult<Option<UserState>> {
        self.read_with_attributes(id, &[]).await
    }

    /// Like [`read`](Self::read), also reporting the named extra attributes.
    pub async fn read_with_attributes(
        &self,
        id: &str,
        attribute_names: &[&str],
    ) -> ResourceResult<Option<UserState>> {
        let Some(mut account) = found(
            self.ctx
                .client()
                .get_account(id, AccountClass::User)
                .await,
        )?
        else {
            log::debug!("User \"{id}\" is gone");
            return Ok(None);
        };
        state_of(id, &mut account, attribute_names).await.map(Some)
    }

    /// Converge the account from `previous` to `desired`.
    ///
    /// The password is only reset when it differs from `previous`; it cannot be
    /// read back to compare. Attributes dropped from the declaration are cleared.
    pub async fn update(
        &self,
        id: &str,
        previous: &UserConfig,
        desired: &UserConfig,
    ) -> ResourceResult<UserState> {
        if desired.sam_account_name != id {
            return Err(ResourceError::Validation(format!(
                "sam_account_name cannot change from \"{id}\" to \"{}\"; the account must be replaced",
                desired.sam_account_name
            )));
        }
        require("password", &desired.password)?;
        validate_spns(&desired.service_principal_names)?;
        let container = parse_dn("container", &desired.container)?;

        let mut account = self
            .ctx
            .client()
            .get_account(id, AccountClass::User)
            .await?;

        if !account.entry().parent_dn()?.eq_ignore_case(&container) {
            account.move_to(&container).await?;
        }
        if account.entry().name() != Some(desired.common_name()) {
            account.rename(desired.common_name()).await?;
        }
        if previous.password != desired.password {
            account.set_password(&desired.password).await?;
        }

        account
            .entry_mut()
            .update_attributes(&attribute_changes(previous, desired))
            .await?;
        account
            .set_password_never_expires(desired.password_never_expires)
            .await?;
        account.set_enabled(desired.enabled).await?;
        reconcile_service_principals(
            &mut account,
            &previous.service_principal_names,
            &desired.service_principal_names,
        )
        .await?;

        let extra = extra_names(desired);
        state_of(id, &mut account, &extra).await
    }

    /// Delete the account if present.
    pub async fn delete(&self, id: &str) -> ResourceResult<()> {
        let Some(account) = found(
            self.ctx
                .client()
                .get_account(id, AccountClass::User)
                .await,
        )?
        else {
            log::debug!("User \"{id}\" already absent");
            return Ok(());
        };
        account.delete().await?;
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn extra_names(config: &UserConfig) -> Vec<&str> {
    config.attributes.keys().map(String::as_str).collect()
}

/// Declared values for every managed attribute; an empty list clears one that
/// was declared before.
///
/// A set `display_name` or `user_principal_name` wins over the same key in
/// `attributes`, as on create. An unset one is cleared only when it was set
/// before and `attributes` does not declare the key.
fn attribute_changes(previous: &UserConfig, desired: &UserConfig) -> AttributeMap {
    let mut changes = AttributeMap::new();
    for name in previous.attributes.keys() {
        if !desired.attributes.contains_key(name) {
            changes.insert(name.clone(), Vec::new());
        }
    }
    for (name, values) in &desired.attributes {
        changes.insert(name.clone(), values.clone());
    }

    for (name, before, after) in [
        (
            DISPLAY_NAME,
            previous.display_name.as_deref(),
            desired.display_name.as_deref(),
        ),
        (
            USER_PRINCIPAL_NAME,
            previous.user_principal_name.as_deref(),
            desired.user_principal_name.as_deref(),
        ),
    ] {
        if let Some(value) = non_empty(after) {
            changes.insert(name.to_string(), vec![value.to_string()]);
        } else if non_empty(before).is_some() && !desired.attributes.contains_key(name) {
            changes.insert(name.to_string(), Vec::new());
        }
    }
    changes
}

async fn state_of(
    id: &str,
    account: &mut Account,
    attribute_names: &[&str],
) -> ResourceResult<UserState> {
    let mut names = vec![
        DISPLAY_NAME,
        USER_PRINCIPAL_NAME,
        adldap_directory::account::SERVICE_PRINCIPAL_NAME,
        adldap_directory::account::USER_ACCOUNT_CONTROL,
    ];
    names.extend_from_slice(attribute_names);
    account.entry_mut().ensure_loaded(&names).await?;

    let flags = account.user_account_control().await?;
    let entry = account.entry_mut();
    let display_name = entry.attribute_value(DISPLAY_NAME).await?;
    let user_principal_name = entry.attribute_value(USER_PRINCIPAL_NAME).await?;

    let mut attributes = BTreeMap::new();
    for name in attribute_names {
        attributes.insert(
            (*name).to_string(),
            entry.get_attribute_values(name).await?,
        );
    }

    Ok(UserState {
        id: id.to_string(),
        sam_account_name: id.to_string(),
        distinguished_name: account.dn().to_string(),
        container: container_of(account)?,
        name: account.entry().name().unwrap_or_default().to_string(),
        display_name,
        user_principal_name,
        service_principal_names: account.service_principals().await?,
        enabled: !flags.contains(AccountControl::ACCOUNTDISABLE),
        password_never_expires: flags.contains(AccountControl::DONT_EXPIRE_PASSWORD),
        attributes,
    })
}
