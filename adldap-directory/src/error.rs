use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all directory operations.
///
/// Lookup and idempotency failures (`NotFound`, `AmbiguousResult`, `AlreadyExists`,
/// `AlreadyHasValue`, `NotEmpty`) are kept apart from transport and protocol failures so
/// that callers can build create-if-missing logic on top of them. Nothing is retried
/// inside this crate.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum DirectoryError {
    /// The text does not follow the distinguished-name grammar.
    #[error("Invalid DN \"{dn}\": {detail}")]
    InvalidDn {
        /// The offending input.
        dn: String,
        /// What is wrong with it.
        detail: String,
    },

    /// A DN operation that needs at least one component was applied to the empty DN.
    #[error("Cannot take the {operation} of an empty DN")]
    EmptyDn {
        /// Name of the DN operation (`parent`, `rdn`, ...).
        operation: String,
    },

    /// Dialing the server or the transport underneath it failed.
    #[error("Connection to {url} failed: {detail}")]
    Connection {
        /// Server URL.
        url: String,
        /// Error details.
        detail: String,
    },

    /// The server rejected the bind identity or secret.
    #[error("Bind as \"{bind_account}\" rejected: invalid credentials")]
    InvalidCredentials {
        /// Identity used for the bind.
        bind_account: String,
        /// Diagnostic message returned by the server, if any.
        raw_message: Option<String>,
    },

    /// No search base was configured and the root DSE did not advertise one.
    #[error("Search base not set and auto-detection failed: {detail}")]
    SearchBaseUndetectable {
        /// Why detection failed.
        detail: String,
    },

    /// A lookup expected to match exactly one entry matched none.
    #[error("No entry returned for {object_class} object \"{name}\"")]
    NotFound {
        /// Object class used in the lookup (`*` for any).
        object_class: String,
        /// DN or account name that was looked up.
        name: String,
    },

    /// A lookup expected to match at most one entry matched several.
    #[error("Too many results ({count}) returned for {object_class} object \"{name}\", expected 1")]
    AmbiguousResult {
        /// Object class used in the lookup (`*` for any).
        object_class: String,
        /// DN or account name that was looked up.
        name: String,
        /// Number of matching entries.
        count: usize,
    },

    /// An object with this DN or account name is already present.
    #[error("An object \"{name}\" already exists")]
    AlreadyExists {
        /// DN or account name of the conflicting object.
        name: String,
    },

    /// Every value being added is already present on the attribute.
    #[error("Attribute {attribute} of \"{dn}\" already has value(s) {values:?}")]
    AlreadyHasValue {
        /// Entry being modified.
        dn: String,
        /// Attribute name.
        attribute: String,
        /// Values that were already present.
        values: Vec<String>,
    },

    /// The organizational unit still has children.
    #[error("Unable to delete \"{dn}\": organizational unit is not empty")]
    NotEmpty {
        /// DN of the organizational unit.
        dn: String,
    },

    /// The target container does not exist or is not a container object.
    #[error("Cannot place \"{dn}\" under non-existent or non-container object \"{container}\"")]
    ContainerNotFound {
        /// DN of the object being created or moved.
        dn: String,
        /// DN of the missing container.
        container: String,
    },

    /// The DN lies outside the configured search base.
    #[error("\"{dn}\" is not below search base \"{search_base}\"")]
    OutsideSearchBase {
        /// Offending DN.
        dn: String,
        /// Configured search base.
        search_base: String,
    },

    /// The leaf component type does not match the kind of object requested.
    #[error("\"{dn}\" must be named with {expected}=")]
    UnexpectedObjectType {
        /// Offending DN.
        dn: String,
        /// Expected RDN attribute type.
        expected: String,
    },

    /// An attribute value could not be interpreted.
    #[error("Invalid value for attribute {attribute} of \"{dn}\": {detail}")]
    InvalidAttributeValue {
        /// Entry the attribute belongs to.
        dn: String,
        /// Attribute name.
        attribute: String,
        /// What is wrong with the value.
        detail: String,
    },

    /// A protocol operation failed; the server's answer is passed through as-is.
    #[error("{operation} \"{target}\" failed: {message}")]
    Protocol {
        /// Operation name (`search`, `add`, `modify`, `modifyDN`, `delete`, `bind`).
        operation: String,
        /// DN the operation targeted.
        target: String,
        /// LDAP result code, when the server produced one.
        result_code: Option<u32>,
        /// Server diagnostic or transport error text.
        message: String,
    },
}

impl DirectoryError {
    /// 是否为预期行为（配置/状态问题而非基础设施故障），用于日志分级。
    ///
    /// Returns `true` when the caller should log at `warn` level, `false` for `error`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidDn { .. }
                | Self::EmptyDn { .. }
                | Self::InvalidCredentials { .. }
                | Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::AlreadyHasValue { .. }
                | Self::NotEmpty { .. }
                | Self::ContainerNotFound { .. }
                | Self::OutsideSearchBase { .. }
                | Self::UnexpectedObjectType { .. }
        )
    }

    /// Whether this is a zero-match lookup failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn protocol(
        operation: &str,
        target: impl Into<String>,
        result_code: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self::Protocol {
            operation: operation.to_string(),
            target: target.into(),
            result_code,
            message: message.into(),
        }
    }
}

/// Convenience type alias for `Result<T, DirectoryError>`.
pub type Result<T> = std::result::Result<T, DirectoryError>;
