//! Resource-layer errors and host diagnostics

use serde::Serialize;
use thiserror::Error;

pub use adldap_directory::DirectoryError;

/// Resource handler error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ResourceError {
    /// Declared input is unusable (bad SPN, bad DN, empty password, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Provider configuration is incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// A resource id that does not follow the expected format
    #[error("Resource ID \"{id}\" is in the wrong format, expected {expected}")]
    InvalidId { id: String, expected: String },

    /// Error from the directory layer
    #[error("{0}")]
    Directory(#[from] DirectoryError),
}

impl ResourceError {
    /// 是否为预期错误（用户输入、资源状态等），用于日志分级。
    ///
    /// Level `warn` should be used when returning `true` and level `error` otherwise.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Config(_) | Self::InvalidId { .. } => true,
            Self::Directory(e) => e.is_expected(),
        }
    }

    /// Log at the level matching [`is_expected`](Self::is_expected) and convert
    /// into a host diagnostic.
    pub fn into_diagnostic(self, summary: &str) -> Diagnostic {
        if self.is_expected() {
            log::warn!("{summary}: {self}");
        } else {
            log::error!("{summary}: {self}");
        }
        Diagnostic::error(summary, self.to_string())
    }
}

/// Resource layer Result type alias
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// What the host shows its user when a handler fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl From<ResourceError> for Diagnostic {
    fn from(err: ResourceError) -> Self {
        let summary = match &err {
            ResourceError::Validation(_) => "Invalid resource configuration",
            ResourceError::Config(_) => "Invalid provider configuration",
            ResourceError::InvalidId { .. } => "Invalid resource ID",
            ResourceError::Directory(_) => "Directory operation failed",
        };
        err.into_diagnostic(summary)
    }
}
