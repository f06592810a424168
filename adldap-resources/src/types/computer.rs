use serde::{Deserialize, Serialize};

/// Declared computer account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputerConfig {
    /// sAMAccountName with the trailing `$`; the resource id
    pub name: String,
    /// DN of the organizational unit or container holding the account
    pub container: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub service_principal_names: Vec<String>,
}

impl ComputerConfig {
    pub fn new(name: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: container.into(),
            description: None,
            service_principal_names: Vec::new(),
        }
    }
}

/// Observed computer account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputerState {
    pub id: String,
    pub name: String,
    pub distinguished_name: String,
    pub container: String,
    pub description: Option<String>,
    pub service_principal_names: Vec<String>,
}
