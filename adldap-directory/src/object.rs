//! Any directory object, classified by kind.

use crate::account::Account;
use crate::dn::DistinguishedName;
use crate::entry::Entry;
use crate::error::Result;
use crate::ou::OrganizationalUnit;
use crate::types::AccountClass;

/// Kind-tagged directory object.
///
/// Every variant exposes the shared [`Entry`] operations through
/// [`entry`](Self::entry) / [`entry_mut`](Self::entry_mut).
#[derive(Debug, Clone)]
pub enum DirectoryObject {
    Account(Account),
    OrganizationalUnit(OrganizationalUnit),
    Other(Entry),
}

impl DirectoryObject {
    /// Classify `entry` by its `objectClass` values (fetched if not yet known).
    ///
    /// `computer` is checked before `user`, since computers are also users.
    pub async fn classify(mut entry: Entry) -> Result<Self> {
        let classes = entry.get_attribute_values("objectClass").await?;
        let has = |name: &str| classes.iter().any(|c| c.eq_ignore_ascii_case(name));

        Ok(if has("computer") {
            Self::Account(Account::new(entry, AccountClass::Computer))
        } else if has("user") {
            Self::Account(Account::new(entry, AccountClass::User))
        } else if has("organizationalUnit") {
            Self::OrganizationalUnit(OrganizationalUnit::new(entry))
        } else {
            Self::Other(entry)
        })
    }

    pub fn entry(&self) -> &Entry {
        match self {
            Self::Account(account) => account.entry(),
            Self::OrganizationalUnit(ou) => ou.entry(),
            Self::Other(entry) => entry,
        }
    }

    pub fn entry_mut(&mut self) -> &mut Entry {
        match self {
            Self::Account(account) => account.entry_mut(),
            Self::OrganizationalUnit(ou) => ou.entry_mut(),
            Self::Other(entry) => entry,
        }
    }

    pub fn dn(&self) -> &DistinguishedName {
        self.entry().dn()
    }

    /// Delete, applying the kind's own guard (organizational units must be empty).
    pub async fn delete(&self) -> Result<()> {
        match self {
            Self::Account(account) => account.delete().await,
            Self::OrganizationalUnit(ou) => ou.delete().await,
            Self::Other(entry) => entry.delete().await,
        }
    }
}
