use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared user account
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    /// Resource id; cannot change after creation
    pub sam_account_name: String,
    pub password: String,
    /// DN of the organizational unit or container holding the account
    pub container: String,
    /// Leaf `CN=` value; defaults to the account name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub service_principal_names: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub password_never_expires: bool,
    /// Any other directory attributes, by LDAP name
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

impl UserConfig {
    pub fn new(
        sam_account_name: impl Into<String>,
        password: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            sam_account_name: sam_account_name.into(),
            password: password.into(),
            container: container.into(),
            name: None,
            display_name: None,
            user_principal_name: None,
            service_principal_names: Vec::new(),
            enabled: true,
            password_never_expires: false,
            attributes: BTreeMap::new(),
        }
    }

    /// The `CN=` value the account is named with.
    pub fn common_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.sam_account_name)
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("sam_account_name", &self.sam_account_name)
            .field("password", &"***")
            .field("container", &self.container)
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("user_principal_name", &self.user_principal_name)
            .field("service_principal_names", &self.service_principal_names)
            .field("enabled", &self.enabled)
            .field("password_never_expires", &self.password_never_expires)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Observed user account. The password cannot be read back and is not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserState {
    pub id: String,
    pub sam_account_name: String,
    pub distinguished_name: String,
    pub container: String,
    pub name: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub service_principal_names: Vec<String>,
    pub enabled: bool,
    pub password_never_expires: bool,
    /// Values of the extra attributes that were asked for
    pub attributes: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_the_account() {
        let config: UserConfig = serde_json::from_str(
            r#"{"sam_account_name":"alice","password":"pw","container":"OU=Widgets,DC=example,DC=com"}"#,
        )
        .unwrap();
        assert!(config.enabled);
        assert!(!config.password_never_expires);
        assert_eq!(config.common_name(), "alice");
    }

    #[test]
    fn debug_masks_password() {
        let config = UserConfig::new("alice", "Secret123!", "OU=Widgets,DC=example,DC=com");
        assert!(!format!("{config:?}").contains("Secret123!"));
    }
}
