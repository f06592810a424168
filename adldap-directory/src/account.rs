//! User and computer accounts.

use crate::dn::{DistinguishedName, RelativeDn};
use crate::entry::Entry;
use crate::error::{DirectoryError, Result};
use crate::types::{AccountClass, Modification};

/// Account-control attribute.
pub const USER_ACCOUNT_CONTROL: &str = "userAccountControl";
/// Service-principal-name attribute.
pub const SERVICE_PRINCIPAL_NAME: &str = "servicePrincipalName";
/// Credential attribute; write-only.
pub const UNICODE_PWD: &str = "unicodePwd";

bitflags::bitflags! {
    /// `userAccountControl` bits.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct AccountControl: u32 {
        const SCRIPT =                         0x0000_0001;
        const ACCOUNTDISABLE =                 0x0000_0002;
        const HOMEDIR_REQUIRED =               0x0000_0008;
        const LOCKOUT =                        0x0000_0010;
        const PASSWD_NOTREQD =                 0x0000_0020;
        const PASSWD_CANT_CHANGE =             0x0000_0040;
        const ENCRYPTED_TEXT_PWD_ALLOWED =     0x0000_0080;
        const TEMP_DUPLICATE_ACCOUNT =         0x0000_0100;
        const NORMAL_ACCOUNT =                 0x0000_0200;
        const INTERDOMAIN_TRUST_ACCOUNT =      0x0000_0800;
        const WORKSTATION_TRUST_ACCOUNT =      0x0000_1000;
        const SERVER_TRUST_ACCOUNT =           0x0000_2000;
        const DONT_EXPIRE_PASSWORD =           0x0001_0000;
        const MNS_LOGON_ACCOUNT =              0x0002_0000;
        const SMARTCARD_REQUIRED =             0x0004_0000;
        const TRUSTED_FOR_DELEGATION =         0x0008_0000;
        const NOT_DELEGATED =                  0x0010_0000;
        const USE_DES_KEY_ONLY =               0x0020_0000;
        const DONT_REQ_PREAUTH =               0x0040_0000;
        const PASSWORD_EXPIRED =               0x0080_0000;
        const TRUSTED_TO_AUTH_FOR_DELEGATION = 0x0100_0000;
        const PARTIAL_SECRETS_ACCOUNT =        0x0400_0000;
    }
}

impl AccountControl {
    /// Flags for a new user: a normal account, created disabled.
    pub const NEW_USER: Self = Self::NORMAL_ACCOUNT.union(Self::ACCOUNTDISABLE);
    /// Flags for a new computer (0x1020).
    pub const NEW_COMPUTER: Self = Self::WORKSTATION_TRUST_ACCOUNT.union(Self::PASSWD_NOTREQD);

    /// Initial flags for `class`.
    pub fn initial(class: AccountClass) -> Self {
        match class {
            AccountClass::User => Self::NEW_USER,
            AccountClass::Computer => Self::NEW_COMPUTER,
        }
    }

    /// Parse the decimal attribute value. Negative values (the attribute is a
    /// signed 32-bit integer on the wire) are reinterpreted bit for bit.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let bits = value
            .parse::<u32>()
            .ok()
            .or_else(|| value.parse::<i32>().ok().map(i32::cast_unsigned))?;
        Some(Self::from_bits_retain(bits))
    }
}

/// Encode a password the way `unicodePwd` requires: wrapped in double quotes,
/// then UTF-16LE.
pub fn encode_password(plaintext: &str) -> Vec<u8> {
    format!("\"{plaintext}\"")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// A user or computer object.
///
/// Flag changes are read-modify-write on the whole bitmask with no
/// compare-and-swap: a concurrent change made elsewhere between the read and
/// the write is overwritten.
#[derive(Debug, Clone)]
pub struct Account {
    entry: Entry,
    class: AccountClass,
}

impl Account {
    pub fn new(entry: Entry, class: AccountClass) -> Self {
        Self { entry, class }
    }

    pub fn class(&self) -> AccountClass {
        self.class
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    pub fn into_entry(self) -> Entry {
        self.entry
    }

    pub fn dn(&self) -> &DistinguishedName {
        self.entry.dn()
    }

    pub async fn sam_account_name(&mut self) -> Result<Option<String>> {
        self.entry.attribute_value("sAMAccountName").await
    }

    // ============ Account control ============

    pub async fn user_account_control(&mut self) -> Result<AccountControl> {
        let value = self.entry.attribute_value(USER_ACCOUNT_CONTROL).await?;
        let value = value.ok_or_else(|| self.invalid_control("attribute is not set"))?;
        AccountControl::parse(&value)
            .ok_or_else(|| self.invalid_control(&format!("\"{value}\" is not an integer")))
    }

    /// Write the whole bitmask; returns whether a request was sent.
    pub async fn set_user_account_control(&mut self, flags: AccountControl) -> Result<bool> {
        self.entry
            .update_attribute(USER_ACCOUNT_CONTROL, vec![flags.bits().to_string()])
            .await
    }

    pub async fn add_control_flags(&mut self, flags: AccountControl) -> Result<bool> {
        let current = self.user_account_control().await?;
        self.set_user_account_control(current | flags).await
    }

    pub async fn remove_control_flags(&mut self, flags: AccountControl) -> Result<bool> {
        let current = self.user_account_control().await?;
        self.set_user_account_control(current.difference(flags))
            .await
    }

    pub async fn is_enabled(&mut self) -> Result<bool> {
        Ok(!self
            .user_account_control()
            .await?
            .contains(AccountControl::ACCOUNTDISABLE))
    }

    pub async fn enable(&mut self) -> Result<bool> {
        self.remove_control_flags(AccountControl::ACCOUNTDISABLE)
            .await
    }

    pub async fn disable(&mut self) -> Result<bool> {
        self.add_control_flags(AccountControl::ACCOUNTDISABLE).await
    }

    pub async fn set_enabled(&mut self, enabled: bool) -> Result<bool> {
        if enabled {
            self.enable().await
        } else {
            self.disable().await
        }
    }

    pub async fn password_never_expires(&mut self) -> Result<bool> {
        Ok(self
            .user_account_control()
            .await?
            .contains(AccountControl::DONT_EXPIRE_PASSWORD))
    }

    pub async fn set_password_never_expires(&mut self, never_expires: bool) -> Result<bool> {
        if never_expires {
            self.add_control_flags(AccountControl::DONT_EXPIRE_PASSWORD)
                .await
        } else {
            self.remove_control_flags(AccountControl::DONT_EXPIRE_PASSWORD)
                .await
        }
    }

    // ============ Credentials ============

    /// Replace the password with one modify request.
    ///
    /// The attribute cannot be read back, so nothing is cached and the request is
    /// always sent.
    pub async fn set_password(&self, plaintext: &str) -> Result<()> {
        self.entry
            .modify(&[Modification::Replace(
                UNICODE_PWD.to_string(),
                vec![encode_password(plaintext)],
            )])
            .await?;
        log::info!("Set password of \"{}\"", self.entry.dn());
        Ok(())
    }

    // ============ Service principals ============

    pub async fn service_principals(&mut self) -> Result<Vec<String>> {
        self.entry.get_attribute_values(SERVICE_PRINCIPAL_NAME).await
    }

    pub async fn has_service_principal(&mut self, spn: &str) -> Result<bool> {
        self.entry
            .has_attribute_values(SERVICE_PRINCIPAL_NAME, &[spn])
            .await
    }

    /// Fails with [`DirectoryError::AlreadyHasValue`] when `spn` is already set.
    pub async fn add_service_principal(&mut self, spn: &str) -> Result<()> {
        self.entry
            .add_attribute_values(SERVICE_PRINCIPAL_NAME, &[spn])
            .await
    }

    /// No-op when `spn` is not set.
    pub async fn remove_service_principal(&mut self, spn: &str) -> Result<()> {
        self.entry
            .remove_attribute_values(SERVICE_PRINCIPAL_NAME, &[spn])
            .await
    }

    // ============ Naming ============

    /// Rename to `CN=<new_name>` in the same container.
    pub async fn rename(&mut self, new_name: &str) -> Result<()> {
        self.entry.rename(RelativeDn::new("CN", new_name)).await
    }

    pub async fn move_to(&mut self, container: &DistinguishedName) -> Result<()> {
        self.entry.move_to(container).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.entry.delete().await
    }

    fn invalid_control(&self, detail: &str) -> DirectoryError {
        DirectoryError::InvalidAttributeValue {
            dn: self.entry.dn().to_string(),
            attribute: USER_ACCOUNT_CONTROL.to_string(),
            detail: detail.to_string(),
        }
    }
}
