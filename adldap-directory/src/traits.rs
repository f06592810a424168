use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Modification, RawEntry, SearchRequest};

/// 目录协议原语 Trait
///
/// The five protocol primitives everything else in this crate is built from.
/// Implementations pass server failures through as [`DirectoryError`](crate::DirectoryError)
/// without retrying. [`LdapConnection`](crate::LdapConnection) is the network
/// implementation; tests use an in-memory one.
///
/// Whether one connection may be used from several tasks at once is up to the
/// implementation; the higher layers never issue concurrent calls themselves.
#[async_trait]
pub trait DirectoryConnection: Send + Sync {
    /// Run one search and return every non-referral entry.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>>;

    /// Add an entry with the given attributes (object class included).
    async fn add(&self, dn: &str, attributes: &[(String, Vec<Vec<u8>>)]) -> Result<()>;

    /// Apply all changes to one entry in a single request.
    async fn modify(&self, dn: &str, changes: &[Modification]) -> Result<()>;

    /// Rename and/or move an entry. `new_superior = None` keeps the current parent.
    async fn modify_dn(
        &self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
        new_superior: Option<&str>,
    ) -> Result<()>;

    /// Delete a leaf entry.
    async fn delete(&self, dn: &str) -> Result<()>;
}
