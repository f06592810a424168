//! LDAP result-code mapping

use ldap3::LdapError;

use crate::error::DirectoryError;

/// 原始 LDAP 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawLdapError {
    /// LDAP result code, absent for transport failures
    pub rc: Option<u32>,
    /// Server diagnostic or transport error text
    pub message: String,
}

impl RawLdapError {
    pub fn from_ldap3(err: LdapError) -> Self {
        match err {
            LdapError::LdapResult { result } => {
                let message = if result.text.is_empty() {
                    result_code_name(result.rc).to_string()
                } else {
                    format!("{} ({})", result_code_name(result.rc), result.text.trim_end_matches('\0'))
                };
                Self {
                    rc: Some(result.rc),
                    message,
                }
            }
            other => Self {
                rc: None,
                message: other.to_string(),
            },
        }
    }
}

/// 错误上下文信息（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct ErrorContext<'a> {
    /// Protocol operation (`bind`, `search`, `add`, ...)
    pub operation: &'a str,
    /// DN the operation targeted
    pub target: &'a str,
}

/// Map a failed protocol call to the crate error type.
///
/// Only a bind can produce [`DirectoryError::InvalidCredentials`]; every other
/// non-success code is passed through as [`DirectoryError::Protocol`] with the
/// operation and target prepended.
pub(crate) fn map_error(raw: RawLdapError, context: &ErrorContext<'_>) -> DirectoryError {
    match (context.operation, raw.rc) {
        // 49: invalidCredentials
        ("bind", Some(49)) => DirectoryError::InvalidCredentials {
            bind_account: context.target.to_string(),
            raw_message: Some(raw.message),
        },
        _ => DirectoryError::protocol(context.operation, context.target, raw.rc, raw.message),
    }
}

/// RFC 4511 §4.1.9 name of a result code.
pub(crate) fn result_code_name(rc: u32) -> &'static str {
    match rc {
        0 => "success",
        1 => "operationsError",
        2 => "protocolError",
        3 => "timeLimitExceeded",
        4 => "sizeLimitExceeded",
        7 => "authMethodNotSupported",
        8 => "strongerAuthRequired",
        10 => "referral",
        11 => "adminLimitExceeded",
        12 => "unavailableCriticalExtension",
        13 => "confidentialityRequired",
        16 => "noSuchAttribute",
        17 => "undefinedAttributeType",
        18 => "inappropriateMatching",
        19 => "constraintViolation",
        20 => "attributeOrValueExists",
        21 => "invalidAttributeSyntax",
        32 => "noSuchObject",
        34 => "invalidDNSyntax",
        49 => "invalidCredentials",
        50 => "insufficientAccessRights",
        51 => "busy",
        52 => "unavailable",
        53 => "unwillingToPerform",
        64 => "namingViolation",
        65 => "objectClassViolation",
        66 => "notAllowedOnNonLeaf",
        67 => "notAllowedOnRDN",
        68 => "entryAlreadyExists",
        69 => "objectClassModsProhibited",
        71 => "affectsMultipleDSAs",
        80 => "other",
        _ => "unknown result code",
    }
}
