//! Provider configuration

use std::fmt;
use std::time::Duration;

use adldap_directory::{ConnectionSettings, DEFAULT_CONNECT_TIMEOUT};
use serde::Deserialize;

use crate::error::{Diagnostic, ResourceError, ResourceResult};

pub const ENV_URL: &str = "ADLDAP_URL";
pub const ENV_BIND_ACCOUNT: &str = "ADLDAP_BIND_ACCOUNT";
pub const ENV_BIND_PASSWORD: &str = "ADLDAP_BIND_PASSWORD";
pub const ENV_SEARCH_BASE: &str = "ADLDAP_SEARCH_BASE";

/// Search-base value meaning "detect it from the server".
const SEARCH_BASE_UNSET: &str = "UNSET";

/// Connection parameters for the whole provider.
///
/// Read once at startup and turned into [`ConnectionSettings`]; the directory
/// layer never looks at the environment itself.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Server URL, e.g. `ldaps://dc1.example.com`.
    pub url: String,
    pub bind_account: String,
    pub bind_password: String,
    /// `None` means detect from the root DSE.
    #[serde(default)]
    pub search_base: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub starttls: bool,
    #[serde(default)]
    pub tls_skip_verify: bool,
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

impl ProviderConfig {
    pub fn new(
        url: impl Into<String>,
        bind_account: impl Into<String>,
        bind_password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            bind_account: bind_account.into(),
            bind_password: bind_password.into(),
            search_base: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            starttls: false,
            tls_skip_verify: false,
        }
    }

    /// Read the `ADLDAP_*` environment variables.
    pub fn from_env() -> ResourceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ResourceResult<Self> {
        let url = lookup(ENV_URL).unwrap_or_default();
        let bind_account = lookup(ENV_BIND_ACCOUNT).unwrap_or_default();
        let bind_password = lookup(ENV_BIND_PASSWORD).unwrap_or_default();

        let mut config = Self::new(url, bind_account, bind_password);
        config.search_base = lookup(ENV_SEARCH_BASE);
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and normalize the search base.
    pub fn validate(&mut self) -> ResourceResult<()> {
        if self.url.trim().is_empty() {
            return Err(ResourceError::Config(format!(
                "no url provided for LDAP client (set {ENV_URL})"
            )));
        }
        if self.bind_account.trim().is_empty() {
            return Err(ResourceError::Config(format!(
                "no bind account provided (set {ENV_BIND_ACCOUNT})"
            )));
        }
        self.search_base = self
            .search_base
            .take()
            .map(|base| base.trim().to_string())
            .filter(|base| !base.is_empty() && base != SEARCH_BASE_UNSET);
        Ok(())
    }

    /// Settings that work but weaken the session's transport security.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        let mut warnings = Vec::new();
        if self.tls_skip_verify {
            warnings.push(Diagnostic::warning(
                "TLS certificate verification is disabled",
                format!("the server certificate of {} is not checked", self.url),
            ));
        }
        if self.url.trim_start().starts_with("ldap://") && !self.starttls {
            warnings.push(Diagnostic::warning(
                "Unencrypted LDAP connection",
                format!(
                    "{} is plain ldap:// without StartTLS; the bind password is sent in clear text",
                    self.url
                ),
            ));
        }
        warnings
    }

    /// Settings handed to the directory layer.
    pub fn connection_settings(&self) -> ConnectionSettings {
        let mut settings = ConnectionSettings::new(
            self.url.clone(),
            self.bind_account.clone(),
            self.bind_password.clone(),
        );
        settings.search_base.clone_from(&self.search_base);
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        settings.starttls = self.starttls;
        settings.tls_skip_verify = self.tls_skip_verify;
        settings
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("bind_account", &self.bind_account)
            .field("bind_password", &"***")
            .field("search_base", &self.search_base)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("starttls", &self.starttls)
            .field("tls_skip_verify", &self.tls_skip_verify)
            .finish()
    }
}
