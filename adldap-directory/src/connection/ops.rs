//! `DirectoryConnection` over ldap3

use std::collections::HashSet;

use async_trait::async_trait;
use ldap3::{LdapError, Mod, Scope, SearchEntry};

use crate::error::{DirectoryError, Result};
use crate::traits::DirectoryConnection;
use crate::types::{Modification, RawEntry, SearchRequest, SearchScope};
use crate::utils::log_sanitizer::{changes_for_log, truncate_for_log};

use super::{ErrorContext, LdapConnection, RawLdapError, map_error};

impl LdapConnection {
    fn map_ldap_error(err: LdapError, operation: &str, target: &str) -> DirectoryError {
        let raw = RawLdapError::from_ldap3(err);
        log::debug!(
            "[ldap] {operation} \"{target}\" failed (rc={:?}): {}",
            raw.rc,
            raw.message
        );
        map_error(raw, &ErrorContext { operation, target })
    }
}

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn to_value_set(values: &[Vec<u8>]) -> HashSet<Vec<u8>> {
    values.iter().cloned().collect()
}

fn to_mod(change: &Modification) -> Mod<Vec<u8>> {
    let attr = change.attribute().as_bytes().to_vec();
    let values = to_value_set(change.values());
    match change {
        Modification::Add(..) => Mod::Add(attr, values),
        Modification::Delete(..) => Mod::Delete(attr, values),
        Modification::Replace(..) => Mod::Replace(attr, values),
    }
}

#[async_trait]
impl DirectoryConnection for LdapConnection {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>> {
        log::debug!(
            "[ldap] search base=\"{}\" scope={:?} filter={} attrs={:?}",
            request.base,
            request.scope,
            truncate_for_log(&request.filter),
            request.attributes
        );

        let mut ldap = self.ldap.clone();
        let (entries, _) = ldap
            .search(
                &request.base,
                to_scope(request.scope),
                &request.filter,
                &request.attributes,
            )
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| Self::map_ldap_error(e, "search", &request.base))?;

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            // AD 在域根子树搜索时会返回 continuation reference
            if entry.is_ref() {
                continue;
            }
            let SearchEntry {
                dn,
                attrs,
                bin_attrs,
            } = SearchEntry::construct(entry);
            if !bin_attrs.is_empty() {
                log::debug!(
                    "[ldap] dropping binary attributes {:?} of \"{dn}\"",
                    bin_attrs.keys().collect::<Vec<_>>()
                );
            }
            out.push(RawEntry {
                dn,
                attributes: attrs,
            });
        }

        log::debug!("[ldap] search returned {} entries", out.len());
        Ok(out)
    }

    async fn add(&self, dn: &str, attributes: &[(String, Vec<Vec<u8>>)]) -> Result<()> {
        log::debug!(
            "[ldap] add \"{dn}\" attrs={:?}",
            attributes.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );

        let request: Vec<(Vec<u8>, HashSet<Vec<u8>>)> = attributes
            .iter()
            .map(|(name, values)| (name.as_bytes().to_vec(), to_value_set(values)))
            .collect();

        let mut ldap = self.ldap.clone();
        ldap.add(dn, request)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| Self::map_ldap_error(e, "add", dn))?;
        Ok(())
    }

    async fn modify(&self, dn: &str, changes: &[Modification]) -> Result<()> {
        log::debug!("[ldap] modify \"{dn}\": {}", changes_for_log(changes));

        let mods: Vec<Mod<Vec<u8>>> = changes.iter().map(to_mod).collect();
        let mut ldap = self.ldap.clone();
        ldap.modify(dn, mods)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| Self::map_ldap_error(e, "modify", dn))?;
        Ok(())
    }

    async fn modify_dn(
        &self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
        new_superior: Option<&str>,
    ) -> Result<()> {
        log::debug!(
            "[ldap] modifyDN \"{dn}\" newrdn=\"{new_rdn}\" deleteoldrdn={delete_old_rdn} newsuperior={new_superior:?}"
        );

        let mut ldap = self.ldap.clone();
        ldap.modifydn(dn, new_rdn, delete_old_rdn, new_superior)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| Self::map_ldap_error(e, "modifyDN", dn))?;
        Ok(())
    }

    async fn delete(&self, dn: &str) -> Result<()> {
        log::debug!("[ldap] delete \"{dn}\"");

        let mut ldap = self.ldap.clone();
        ldap.delete(dn)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| Self::map_ldap_error(e, "delete", dn))?;
        Ok(())
    }
}
