use serde::{Deserialize, Serialize};

/// Declared organizational unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationalUnitConfig {
    /// Full DN, e.g. `OU=Widgets,DC=example,DC=com`
    pub distinguished_name: String,
    /// Create missing `OU=` ancestors instead of failing
    #[serde(default)]
    pub create_parents: bool,
}

impl OrganizationalUnitConfig {
    pub fn new(distinguished_name: impl Into<String>) -> Self {
        Self {
            distinguished_name: distinguished_name.into(),
            create_parents: false,
        }
    }

    #[must_use]
    pub fn with_create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }
}

/// Observed organizational unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationalUnitState {
    /// Resource id; the DN
    pub id: String,
    pub distinguished_name: String,
    /// Parent container DN
    pub parent: String,
}
