//! One directory object plus its client and attribute cache.

use std::collections::BTreeSet;

use crate::cache::AttributeCache;
use crate::client::{ANY_CLASS, DirectoryClient, lookup_filter};
use crate::dn::{DistinguishedName, RelativeDn};
use crate::error::{DirectoryError, Result};
use crate::types::{AttributeMap, Modification, RawEntry};
use crate::utils::log_sanitizer::values_for_log;

/// A directory object.
///
/// Writes go to the server first; on success the cache is patched with what was
/// written. Changes made by anyone else are not seen until [`refresh`](Self::refresh).
#[derive(Debug, Clone)]
pub struct Entry {
    client: DirectoryClient,
    dn: DistinguishedName,
    cache: AttributeCache,
}

impl Entry {
    pub(crate) fn from_search(
        client: DirectoryClient,
        raw: RawEntry,
        requested: &[String],
    ) -> Result<Self> {
        let dn = DistinguishedName::parse(&raw.dn)?;
        let mut cache = AttributeCache::new();
        cache.replace_snapshot(requested, raw.attributes);
        Ok(Self { client, dn, cache })
    }

    pub fn dn(&self) -> &DistinguishedName {
        &self.dn
    }

    pub fn client(&self) -> &DirectoryClient {
        &self.client
    }

    pub fn parent_dn(&self) -> Result<DistinguishedName> {
        self.dn.parent()
    }

    pub fn rdn(&self) -> Result<DistinguishedName> {
        self.dn.rdn()
    }

    /// Value of the leaf component.
    pub fn name(&self) -> Option<&str> {
        self.dn.name()
    }

    pub fn cache(&self) -> &AttributeCache {
        &self.cache
    }

    // ============ Attribute access ============

    /// Re-read every known attribute; the old snapshot survives a failure.
    pub async fn refresh(&mut self) -> Result<()> {
        self.fetch(&[]).await
    }

    /// Make every name in `names` known, with at most one round trip.
    pub async fn ensure_loaded(&mut self, names: &[&str]) -> Result<()> {
        if self.cache.unknown(names).is_empty() {
            return Ok(());
        }
        self.fetch(names).await
    }

    async fn fetch(&mut self, extra: &[&str]) -> Result<()> {
        let requested = self.cache.request_list(extra);
        let attributes: Vec<&str> = requested.iter().map(String::as_str).collect();
        let dn_text = self.dn.to_string();

        let mut entries = self
            .client
            .search(
                &lookup_filter(ANY_CLASS, "distinguishedName", &dn_text),
                &attributes,
            )
            .await?;

        let raw = match entries.len() {
            0 => {
                return Err(DirectoryError::NotFound {
                    object_class: ANY_CLASS.to_string(),
                    name: dn_text,
                });
            }
            1 => entries.remove(0),
            count => {
                return Err(DirectoryError::AmbiguousResult {
                    object_class: ANY_CLASS.to_string(),
                    name: dn_text,
                    count,
                });
            }
        };

        self.cache.replace_snapshot(&requested, raw.attributes);
        Ok(())
    }

    /// All values of `name`; empty when the object has none.
    pub async fn get_attribute_values(&mut self, name: &str) -> Result<Vec<String>> {
        self.ensure_loaded(&[name]).await?;
        Ok(self.cache.get(name).map(<[String]>::to_vec).unwrap_or_default())
    }

    /// First value of `name`.
    pub async fn attribute_value(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.get_attribute_values(name).await?.into_iter().next())
    }

    /// Whether every value in `values` is present on `name`.
    pub async fn has_attribute_values(&mut self, name: &str, values: &[&str]) -> Result<bool> {
        let current = self.get_attribute_values(name).await?;
        Ok(values.iter().all(|v| current.iter().any(|c| c == v)))
    }

    // ============ Attribute writes ============

    /// Replace the attributes whose value sets differ from the cached ones.
    ///
    /// Returns whether a modify request was sent; unchanged input sends nothing.
    /// An empty value list removes the attribute.
    pub async fn update_attributes(&mut self, attributes: &AttributeMap) -> Result<bool> {
        let names: Vec<&str> = attributes.keys().map(String::as_str).collect();
        self.ensure_loaded(&names).await?;

        let changes: Vec<Modification> = attributes
            .iter()
            .filter(|(name, values)| {
                let current = self.cache.get(name).unwrap_or_default();
                as_set(current) != as_set(values)
            })
            .map(|(name, values)| Modification::replace(name.clone(), values.iter().cloned()))
            .collect();

        if changes.is_empty() {
            log::debug!("No attribute changes for \"{}\"", self.dn);
            return Ok(false);
        }

        self.modify(&changes).await?;
        for change in &changes {
            let name = change.attribute();
            if let Some(values) = attributes.get(name) {
                log::info!(
                    "Updated {name} of \"{}\" to {}",
                    self.dn,
                    values_for_log(name, values)
                );
                self.cache.set(name, values.clone());
            }
        }
        Ok(true)
    }

    pub async fn update_attribute(&mut self, name: &str, values: Vec<String>) -> Result<bool> {
        let mut attributes = AttributeMap::new();
        attributes.insert(name.to_string(), values);
        self.update_attributes(&attributes).await
    }

    /// Add values to a multi-valued attribute.
    ///
    /// Fails with [`DirectoryError::AlreadyHasValue`] when all of them are already
    /// present; otherwise only the missing ones are sent.
    pub async fn add_attribute_values(&mut self, name: &str, values: &[&str]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let current = self.get_attribute_values(name).await?;
        let mut missing: Vec<String> = Vec::new();
        for value in values {
            if !current.iter().any(|c| c == value) && !missing.iter().any(|m| m == value) {
                missing.push((*value).to_string());
            }
        }

        if missing.is_empty() {
            return Err(DirectoryError::AlreadyHasValue {
                dn: self.dn.to_string(),
                attribute: name.to_string(),
                values: values.iter().map(ToString::to_string).collect(),
            });
        }

        self.modify(&[Modification::add(name, missing.iter().cloned())])
            .await?;
        log::info!("Added {name} value(s) {missing:?} to \"{}\"", self.dn);
        self.cache.append(name, &missing);
        Ok(())
    }

    /// Remove the given values that are present; absent values are ignored.
    pub async fn remove_attribute_values(&mut self, name: &str, values: &[&str]) -> Result<()> {
        let current = self.get_attribute_values(name).await?;
        let present: Vec<String> = current
            .into_iter()
            .filter(|c| values.iter().any(|v| v == c))
            .collect();

        if present.is_empty() {
            log::debug!("{name} of \"{}\" has none of {values:?}, nothing to remove", self.dn);
            return Ok(());
        }

        self.modify(&[Modification::delete(name, present.iter().cloned())])
            .await?;
        log::info!("Removed {name} value(s) {present:?} from \"{}\"", self.dn);
        self.cache.remove(name, &present);
        Ok(())
    }

    /// Send a modify request without touching the cache.
    pub(crate) async fn modify(&self, changes: &[Modification]) -> Result<()> {
        self.client
            .connection()
            .modify(&self.dn.to_string(), changes)
            .await
    }

    // ============ Naming ============

    /// Move under `container`, keeping the leaf component.
    pub async fn move_to(&mut self, container: &DistinguishedName) -> Result<()> {
        let rdn = self.leaf()?;
        self.change_dn(&container.child(rdn)).await
    }

    /// Replace the leaf component, keeping the parent.
    pub async fn rename(&mut self, new_rdn: RelativeDn) -> Result<()> {
        let parent = self.dn.parent()?;
        self.change_dn(&parent.child(new_rdn)).await
    }

    /// Rename and/or move to `new_dn` with a single modify-DN request.
    ///
    /// No-op when `new_dn` equals the current DN. Fails with
    /// [`DirectoryError::AlreadyExists`] when another object holds `new_dn`, and
    /// with [`DirectoryError::ContainerNotFound`] when the new parent is missing.
    /// The parent check is skipped when only the leaf changes.
    pub async fn change_dn(&mut self, new_dn: &DistinguishedName) -> Result<()> {
        if *new_dn == self.dn {
            return Ok(());
        }
        let new_rdn = new_dn.rdn()?;
        let new_parent = new_dn.parent()?;
        let old_parent = self.dn.parent()?;
        let new_text = new_dn.to_string();

        // 仅大小写不同的重命名会命中自身
        if !new_dn.eq_ignore_case(&self.dn)
            && self.client.object_exists(&new_text, ANY_CLASS).await?
        {
            return Err(DirectoryError::AlreadyExists { name: new_text });
        }

        let same_parent = new_parent.eq_ignore_case(&old_parent);
        if !same_parent && !self.client.container_exists(&new_parent).await? {
            return Err(DirectoryError::ContainerNotFound {
                dn: new_text,
                container: new_parent.to_string(),
            });
        }

        let superior = new_parent.to_string();
        self.client
            .connection()
            .modify_dn(
                &self.dn.to_string(),
                &new_rdn.to_string(),
                true,
                if same_parent { None } else { Some(superior.as_str()) },
            )
            .await?;
        log::info!("Changed DN of \"{}\" to \"{new_text}\"", self.dn);

        if let Some(leaf) = new_dn.leaf() {
            if self.cache.is_known(leaf.attr_type()) {
                self.cache
                    .set(leaf.attr_type(), vec![leaf.value().to_string()]);
            }
            if self.cache.is_known("name") {
                self.cache.set("name", vec![leaf.value().to_string()]);
            }
        }
        self.dn = new_dn.clone();
        Ok(())
    }

    /// Delete this (leaf) object.
    pub async fn delete(&self) -> Result<()> {
        let dn_text = self.dn.to_string();
        self.client.connection().delete(&dn_text).await?;
        log::info!("Deleted \"{dn_text}\"");
        Ok(())
    }

    fn leaf(&self) -> Result<RelativeDn> {
        self.dn.leaf().cloned().ok_or_else(|| DirectoryError::EmptyDn {
            operation: "rdn".to_string(),
        })
    }
}

fn as_set(values: &[String]) -> BTreeSet<&str> {
    values.iter().map(String::as_str).collect()
}
