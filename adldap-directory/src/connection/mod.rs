//! LDAP network connection

mod error;
mod ops;

use std::fmt;
use std::time::Duration;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};

use crate::error::{DirectoryError, Result};

pub(crate) use error::{ErrorContext, RawLdapError, map_error};
#[cfg(any(test, feature = "test-utils"))]
pub(crate) use error::result_code_name;

/// Default dial timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to open and bind a session.
///
/// Built once by the embedding application and passed in by value; nothing in
/// this crate reads the environment.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Server URL (`ldap://dc.example.com`, `ldaps://dc.example.com:636`).
    pub url: String,
    /// Bind identity (DN, UPN or `DOMAIN\user`).
    pub bind_account: String,
    /// Bind secret.
    pub bind_password: String,
    /// Search base; `None` means detect it from the root DSE.
    pub search_base: Option<String>,
    /// Dial timeout.
    pub connect_timeout: Duration,
    /// Upgrade a plain `ldap://` connection with StartTLS.
    pub starttls: bool,
    /// Skip server certificate verification.
    pub tls_skip_verify: bool,
}

impl ConnectionSettings {
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
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            starttls: false,
            tls_skip_verify: false,
        }
    }

    #[must_use]
    pub fn with_search_base(mut self, search_base: impl Into<String>) -> Self {
        self.search_base = Some(search_base.into());
        self
    }

    fn ldap_settings(&self) -> LdapConnSettings {
        let settings = LdapConnSettings::new().set_conn_timeout(self.connect_timeout);
        #[cfg(any(feature = "native-tls", feature = "rustls"))]
        let settings = settings
            .set_starttls(self.starttls)
            .set_no_tls_verify(self.tls_skip_verify);
        settings
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url)
            .field("bind_account", &self.bind_account)
            .field("bind_password", &"***")
            .field("search_base", &self.search_base)
            .field("connect_timeout", &self.connect_timeout)
            .field("starttls", &self.starttls)
            .field("tls_skip_verify", &self.tls_skip_verify)
            .finish()
    }
}

/// A bound `ldap3` session.
///
/// The underlying handle is cloned per call, so the methods only need `&self`;
/// `ldap3` multiplexes the clones over one connection.
pub struct LdapConnection {
    pub(crate) ldap: Ldap,
}

impl LdapConnection {
    /// Dial, spawn the connection driver and perform a simple bind.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        log::debug!(
            "[ldap] Connecting to {} as {}",
            settings.url,
            settings.bind_account
        );

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings.ldap_settings(), &settings.url)
            .await
            .map_err(|e| DirectoryError::Connection {
                url: settings.url.clone(),
                detail: e.to_string(),
            })?;
        ldap3::drive!(conn);

        ldap.simple_bind(&settings.bind_account, &settings.bind_password)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| {
                map_error(
                    RawLdapError::from_ldap3(e),
                    &ErrorContext {
                        operation: "bind",
                        target: &settings.bind_account,
                    },
                )
            })?;

        log::info!("[ldap] Bound to {} as {}", settings.url, settings.bind_account);
        Ok(Self { ldap })
    }
}
