//! 组织单位资源

use std::sync::Arc;

use adldap_directory::{DistinguishedName, OrganizationalUnit};

use crate::error::{ResourceError, ResourceResult};
use crate::services::{ProviderContext, found};
use crate::types::{OrganizationalUnitConfig, OrganizationalUnitState};
use crate::validation::parse_dn;

/// Organizational-unit handler. The resource id is the DN.
pub struct OrganizationalUnitService {
    ctx: Arc<ProviderContext>,
}

impl OrganizationalUnitService {
    #[must_use]
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// Create the unit; with `create_parents` unset a missing parent is an error.
    pub async fn create(
        &self,
        config: &OrganizationalUnitConfig,
    ) -> ResourceResult<OrganizationalUnitState> {
        let dn = parse_dn("distinguished_name", &config.distinguished_name)?;
        let client = self.ctx.client();

        let ou = if config.create_parents {
            client.create_organizational_unit_recursive(&dn).await?
        } else {
            client.create_organizational_unit(&dn).await?
        };
        state_of(&ou)
    }

    /// `None` when the unit no longer exists.
    pub async fn read(&self, id: &str) -> ResourceResult<Option<OrganizationalUnitState>> {
        let dn = parse_dn("id", id)?;
        match found(self.ctx.client().get_organizational_unit(&dn).await)? {
            Some(ou) => state_of(&ou).map(Some),
            None => {
                log::debug!("Organizational unit \"{id}\" is gone");
                Ok(None)
            }
        }
    }

    /// Move and/or rename to the declared DN. The new parent must exist.
    pub async fn update(
        &self,
        id: &str,
        config: &OrganizationalUnitConfig,
    ) -> ResourceResult<OrganizationalUnitState> {
        let current = parse_dn("id", id)?;
        let desired = parse_dn("distinguished_name", &config.distinguished_name)?;
        if !self.ctx.client().search_base().is_ancestor_of_ignore_case(&desired) {
            return Err(ResourceError::Validation(format!(
                "organizational unit \"{desired}\" is not below search base \"{}\"",
                self.ctx.client().search_base()
            )));
        }

        let mut ou = self.ctx.client().get_organizational_unit(&current).await?;
        ou.rename(&desired).await?;
        state_of(&ou)
    }

    /// Delete the unit if present. A unit with children is never deleted.
    pub async fn delete(&self, id: &str) -> ResourceResult<()> {
        let dn: DistinguishedName = parse_dn("id", id)?;
        let Some(ou) = found(self.ctx.client().get_organizational_unit(&dn).await)? else {
            log::debug!("Organizational unit \"{id}\" already absent");
            return Ok(());
        };
        ou.delete().await?;
        Ok(())
    }
}

fn state_of(ou: &OrganizationalUnit) -> ResourceResult<OrganizationalUnitState> {
    let dn = ou.dn().to_string();
    Ok(OrganizationalUnitState {
        id: dn.clone(),
        distinguished_name: dn,
        parent: ou.entry().parent_dn()?.to_string(),
    })
}
