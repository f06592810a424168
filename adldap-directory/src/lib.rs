//! # adldap-directory
//!
//! Directory-object layer for managing Active Directory over LDAP.
//!
//! Turns the five protocol primitives (search, add, modify, modify-DN, delete)
//! into idempotent object operations: move, rename, attribute diffing,
//! enable/disable, service-principal set management and recursive
//! organizational-unit creation.
//!
//! ## Layers
//!
//! | Type | Role |
//! |------|------|
//! | [`DistinguishedName`] | Parsing, serialization and arithmetic on DNs. No I/O. |
//! | [`DirectoryConnection`] | The protocol primitives; [`LdapConnection`] implements them over `ldap3`. |
//! | [`DirectoryClient`] | A bound connection plus its search base: lookups, existence checks, creation. |
//! | [`Entry`] | One object with a lazily filled attribute cache. |
//! | [`Account`] / [`OrganizationalUnit`] | Account-control flags, credentials and SPNs / emptiness and guarded delete. |
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls.
//! - **`test-utils`**: Export [`test_utils::MemoryDirectory`], an in-memory directory
//!   for tests of code built on this crate.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use adldap_directory::{
//!     AccountClass, AccountControl, AttributeMap, ConnectionSettings, DirectoryClient,
//!     DistinguishedName,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConnectionSettings::new(
//!         "ldaps://dc1.example.com",
//!         "svc-provision@example.com",
//!         "secret",
//!     );
//!     // Search base is detected from the root DSE when not configured.
//!     let client = DirectoryClient::connect(&settings).await?;
//!
//!     let ou: DistinguishedName = "OU=Widgets,DC=example,DC=com".parse()?;
//!     client.create_organizational_unit_recursive(&ou).await?;
//!
//!     let mut alice = client
//!         .create_account(
//!             "alice",
//!             &ou,
//!             &AttributeMap::new(),
//!             AccountClass::User,
//!             AccountControl::NEW_USER,
//!         )
//!         .await?;
//!     alice.set_password("Secret123!").await?;
//!     alice.enable().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`DirectoryError`]. Lookup and idempotency failures
//! (`NotFound`, `AmbiguousResult`, `AlreadyExists`, `AlreadyHasValue`,
//! `NotEmpty`) are separate variants from protocol failures, which carry the
//! operation, target DN and LDAP result code. Nothing is retried.
//!
//! ## Concurrency
//!
//! Every operation awaits its protocol calls one after another and holds no
//! locks. A [`DirectoryClient`] may be cloned freely; using one connection from
//! several tasks at once is only as safe as the connection itself.

pub mod account;
mod cache;
mod client;
mod connection;
pub mod dn;
mod entry;
mod error;
mod object;
mod ou;
mod traits;
mod types;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use account::{Account, AccountControl, encode_password};
pub use cache::{AttributeCache, NO_ATTRIBUTES};
pub use client::{ANY_CLASS, DirectoryClient};
pub use connection::{ConnectionSettings, DEFAULT_CONNECT_TIMEOUT, LdapConnection};
pub use dn::{AttributeTypeAndValue, DistinguishedName, RelativeDn};
pub use entry::Entry;
pub use error::{DirectoryError, Result};
pub use object::DirectoryObject;
pub use ou::OrganizationalUnit;
pub use traits::DirectoryConnection;
pub use types::{
    AccountClass, AttributeMap, Modification, RawEntry, SearchRequest, SearchScope,
};
