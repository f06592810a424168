use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, ResourceResult};

/// Separator between SPN and account in a composite id
pub const ID_SEPARATOR: &str = "---";

/// Declared membership of one SPN in an account's SPN set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePrincipalConfig {
    /// sAMAccountName of the user or computer
    pub account: String,
    /// `service/host[:port]`
    pub spn: String,
}

impl ServicePrincipalConfig {
    pub fn new(account: impl Into<String>, spn: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            spn: spn.into(),
        }
    }
}

/// Composite resource id: `{spn}---{account}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipalId {
    pub spn: String,
    pub account: String,
}

impl ServicePrincipalId {
    pub fn new(spn: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            spn: spn.into(),
            account: account.into(),
        }
    }

    /// Split an id into its SPN and account; exactly one separator is allowed.
    pub fn parse(id: &str) -> ResourceResult<Self> {
        let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
        match parts.as_slice() {
            [spn, account] if !spn.is_empty() && !account.is_empty() => {
                Ok(Self::new(*spn, *account))
            }
            _ => Err(ResourceError::InvalidId {
                id: id.to_string(),
                expected: "\"service/host---samaccountname\"".to_string(),
            }),
        }
    }
}

impl fmt::Display for ServicePrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ID_SEPARATOR}{}", self.spn, self.account)
    }
}

/// Observed SPN membership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePrincipalState {
    pub id: String,
    pub account: String,
    pub spn: String,
}

impl From<ServicePrincipalId> for ServicePrincipalState {
    fn from(id: ServicePrincipalId) -> Self {
        Self {
            id: id.to_string(),
            account: id.account,
            spn: id.spn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips() {
        let id = ServicePrincipalId::parse("HTTP/web.example.com---alice").unwrap();
        assert_eq!(id.spn, "HTTP/web.example.com");
        assert_eq!(id.account, "alice");
        assert_eq!(id.to_string(), "HTTP/web.example.com---alice");
    }

    #[test]
    fn id_requires_exactly_one_separator() {
        for bad in ["HTTP/web.example.com", "a---b---c", "---alice", "HTTP/web---"] {
            assert!(
                matches!(
                    ServicePrincipalId::parse(bad),
                    Err(ResourceError::InvalidId { .. })
                ),
                "{bad}"
            );
        }
    }
}
