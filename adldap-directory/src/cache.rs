//! Per-entry attribute cache.
//!
//! Every attribute name is either *known* (requested at least once; the cached
//! value is authoritative, possibly empty) or *unknown*. Names are matched
//! case-insensitively, as the server does.

use std::collections::{BTreeMap, HashMap};

/// Selector that asks the server for no attributes at all (RFC 4511 §4.5.1.8).
pub const NO_ATTRIBUTES: &str = "1.1";

/// Known attribute names and their values for one entry.
#[derive(Debug, Clone, Default)]
pub struct AttributeCache {
    /// lowercase name -> name as first requested
    known: BTreeMap<String, String>,
    /// lowercase name -> values
    values: HashMap<String, Vec<String>>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` has been requested before.
    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains_key(&name.to_ascii_lowercase())
    }

    /// Names in `names` that are still unknown, without duplicates.
    pub fn unknown<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = Vec::new();
        for name in names {
            if !self.is_known(name) && !out.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                out.push(name);
            }
        }
        out
    }

    /// Attribute list for a refresh that also covers `extra`.
    ///
    /// Falls back to [`NO_ATTRIBUTES`] when nothing is known yet, so that a
    /// refresh never pulls every attribute of the entry.
    pub fn request_list(&self, extra: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = self.known.values().cloned().collect();
        for name in self.unknown(extra) {
            names.push(name.to_string());
        }
        if names.is_empty() {
            vec![NO_ATTRIBUTES.to_string()]
        } else {
            names
        }
    }

    /// Install a fresh snapshot fetched with `requested`.
    ///
    /// Every requested name becomes known; names the server did not return are
    /// cached as empty. Values for names that were not requested are ignored.
    pub fn replace_snapshot(
        &mut self,
        requested: &[String],
        attributes: HashMap<String, Vec<String>>,
    ) {
        let mut by_lower: HashMap<String, Vec<String>> = HashMap::with_capacity(attributes.len());
        for (name, values) in attributes {
            by_lower
                .entry(name.to_ascii_lowercase())
                .or_default()
                .extend(values);
        }

        let mut known = BTreeMap::new();
        let mut values = HashMap::new();
        for name in requested {
            if name == NO_ATTRIBUTES {
                continue;
            }
            let lower = name.to_ascii_lowercase();
            values.insert(lower.clone(), by_lower.remove(&lower).unwrap_or_default());
            known.entry(lower).or_insert_with(|| name.clone());
        }
        self.known = known;
        self.values = values;
    }

    /// Cached values, or `None` when the attribute is unknown.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        let lower = name.to_ascii_lowercase();
        if !self.known.contains_key(&lower) {
            return None;
        }
        Some(self.values.get(&lower).map_or(&[][..], Vec::as_slice))
    }

    /// Record a value written to the server.
    pub fn set(&mut self, name: &str, values: Vec<String>) {
        let lower = name.to_ascii_lowercase();
        self.known
            .entry(lower.clone())
            .or_insert_with(|| name.to_string());
        self.values.insert(lower, values);
    }

    /// Append values after a successful add-modify; no-op for unknown names.
    pub fn append(&mut self, name: &str, added: &[String]) {
        if let Some(current) = self.values_mut(name) {
            current.extend(added.iter().cloned());
        }
    }

    /// Drop values after a successful delete-modify; no-op for unknown names.
    pub fn remove(&mut self, name: &str, removed: &[String]) {
        if let Some(current) = self.values_mut(name) {
            current.retain(|v| !removed.contains(v));
        }
    }

    fn values_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        let lower = name.to_ascii_lowercase();
        if !self.known.contains_key(&lower) {
            return None;
        }
        Some(self.values.entry(lower).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
            .collect()
    }

    #[test]
    fn empty_cache_requests_no_attributes() {
        let cache = AttributeCache::new();
        assert_eq!(cache.request_list(&[]), vec![NO_ATTRIBUTES.to_string()]);
        assert_eq!(cache.request_list(&["description"]), vec!["description".to_string()]);
    }

    #[test]
    fn requested_but_absent_is_known_empty() {
        let mut cache = AttributeCache::new();
        let requested = cache.request_list(&["description", "displayName"]);
        cache.replace_snapshot(&requested, attrs(&[("displayName", &["Alice"])]));

        assert_eq!(cache.get("description"), Some(&[][..]));
        assert_eq!(cache.get("DISPLAYNAME"), Some(&["Alice".to_string()][..]));
        assert_eq!(cache.get("mail"), None);
        assert!(cache.unknown(&["mail", "description"]) == vec!["mail"]);
    }

    #[test]
    fn server_spelling_does_not_matter() {
        let mut cache = AttributeCache::new();
        let requested = cache.request_list(&["samaccountname"]);
        cache.replace_snapshot(&requested, attrs(&[("sAMAccountName", &["alice"])]));
        assert_eq!(cache.get("sAMAccountName"), Some(&["alice".to_string()][..]));
    }

    #[test]
    fn refresh_keeps_previously_known_names() {
        let mut cache = AttributeCache::new();
        cache.replace_snapshot(&["description".to_string()], attrs(&[]));
        let requested = cache.request_list(&["mail"]);
        assert_eq!(requested, vec!["description".to_string(), "mail".to_string()]);
    }

    #[test]
    fn unknown_deduplicates_case_insensitively() {
        let cache = AttributeCache::new();
        assert_eq!(cache.unknown(&["mail", "MAIL", "cn"]), vec!["mail", "cn"]);
    }

    #[test]
    fn patches_only_touch_known_names() {
        let mut cache = AttributeCache::new();
        cache.set("servicePrincipalName", vec!["HTTP/a".to_string()]);
        cache.append("servicePrincipalName", &["HTTP/b".to_string()]);
        cache.remove("servicePrincipalName", &["HTTP/a".to_string()]);
        assert_eq!(
            cache.get("servicePrincipalName"),
            Some(&["HTTP/b".to_string()][..])
        );

        cache.append("mail", &["x@example.com".to_string()]);
        assert_eq!(cache.get("mail"), None);
    }
}
