//! 测试辅助模块
//!
//! [`MemoryDirectory`] is an in-memory [`DirectoryConnection`] that behaves like a
//! small Active Directory: object classes are expanded, the RDN attribute is
//! maintained, result codes match what a server returns, and every protocol
//! call is recorded so tests can count round trips.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::connection::result_code_name;
use crate::dn::DistinguishedName;
use crate::error::{DirectoryError, Result};
use crate::traits::DirectoryConnection;
use crate::types::{Modification, RawEntry, SearchRequest, SearchScope};
use crate::utils::log_sanitizer::is_secret_attribute;

// ===== RecordedCall =====

/// One protocol call seen by [`MemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Search(SearchRequest),
    Add {
        dn: String,
        attributes: Vec<(String, Vec<Vec<u8>>)>,
    },
    Modify {
        dn: String,
        changes: Vec<Modification>,
    },
    ModifyDn {
        dn: String,
        new_rdn: String,
        delete_old_rdn: bool,
        new_superior: Option<String>,
    },
    Delete {
        dn: String,
    },
}

impl RecordedCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Search(_))
    }

    fn operation(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Add { .. } => "add",
            Self::Modify { .. } => "modify",
            Self::ModifyDn { .. } => "modifyDN",
            Self::Delete { .. } => "delete",
        }
    }
}

// ===== MemoryDirectory =====

#[derive(Debug, Clone)]
struct StoredEntry {
    dn: DistinguishedName,
    /// lowercase name -> (name as written, values)
    attributes: BTreeMap<String, (String, Vec<String>)>,
}

impl StoredEntry {
    fn new(dn: DistinguishedName) -> Self {
        Self {
            dn,
            attributes: BTreeMap::new(),
        }
    }

    fn values(&self, name: &str) -> &[String] {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map_or(&[][..], |(_, values)| values.as_slice())
    }

    fn set(&mut self, name: &str, values: Vec<String>) {
        let lower = name.to_ascii_lowercase();
        if values.is_empty() {
            self.attributes.remove(&lower);
        } else {
            self.attributes.insert(lower, (name.to_string(), values));
        }
    }

    /// Keep the naming attributes in step with the leaf component.
    fn sync_rdn(&mut self) {
        if let Some(leaf) = self.dn.leaf().cloned() {
            for atv in leaf.attributes() {
                self.set(&atv.attr_type.to_ascii_lowercase(), vec![atv.value.clone()]);
            }
            self.set("name", vec![leaf.value().to_string()]);
        }
    }

    fn to_raw(&self, attributes: &[String]) -> RawEntry {
        let wants_all =
            attributes.is_empty() || attributes.iter().any(|a| a == "*");
        let wants_none = !wants_all && attributes.iter().all(|a| a == "1.1");

        let mut out = std::collections::HashMap::new();
        if !wants_none {
            let dn_text = self.dn.to_string();
            let mut synthesized = vec![("distinguishedName".to_string(), vec![dn_text])];
            synthesized.extend(
                self.attributes
                    .values()
                    .map(|(name, values)| (name.clone(), values.clone())),
            );
            for (name, values) in synthesized {
                if wants_all || attributes.iter().any(|a| a.eq_ignore_ascii_case(&name)) {
                    out.insert(name, values);
                }
            }
        }
        RawEntry {
            dn: self.dn.to_string(),
            attributes: out,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    naming_context: Option<String>,
    entries: BTreeMap<String, StoredEntry>,
    calls: Vec<RecordedCall>,
    fail_next: Option<(String, u32)>,
}

/// In-memory directory; clones share state.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    state: Arc<RwLock<State>>,
}

fn key(dn: &DistinguishedName) -> String {
    dn.to_string().to_lowercase()
}

fn parse(dn: &str) -> DistinguishedName {
    DistinguishedName::parse(dn).unwrap_or_default()
}

fn fail(operation: &str, target: &str, rc: u32) -> DirectoryError {
    DirectoryError::Protocol {
        operation: operation.to_string(),
        target: target.to_string(),
        result_code: Some(rc),
        message: result_code_name(rc).to_string(),
    }
}

/// Mirror of the class chain AD adds for structural classes.
fn expand_classes(classes: &[String]) -> Vec<String> {
    let has = |name: &str| classes.iter().any(|c| c.eq_ignore_ascii_case(name));
    let mut out = vec!["top".to_string()];
    if has("user") || has("computer") {
        out.extend(["person", "organizationalPerson", "user"].map(String::from));
    }
    if has("domain") {
        out.extend(["domain", "domainDNS"].map(String::from));
    }
    for class in classes {
        if !out.iter().any(|c| c.eq_ignore_ascii_case(class)) {
            out.push(class.clone());
        }
    }
    out
}

/// Whether `dn` is reached from `base` with `scope`.
fn in_scope(base: &DistinguishedName, dn: &DistinguishedName, scope: SearchScope) -> bool {
    let depth = match dn.len().checked_sub(base.len()) {
        Some(depth) => depth,
        None => return false,
    };
    let suffix = DistinguishedName::from_rdns(dn.components()[depth..].to_vec());
    if !suffix.eq_ignore_case(base) {
        return false;
    }
    match scope {
        SearchScope::Base => depth == 0,
        SearchScope::OneLevel => depth == 1,
        SearchScope::Subtree => true,
    }
}

impl MemoryDirectory {
    /// A directory holding only the domain object `naming_context`.
    pub fn new(naming_context: &str) -> Self {
        Self::build(naming_context, Some(naming_context.to_string()))
    }

    /// Like [`new`](Self::new), but the root DSE does not advertise a naming context.
    pub fn without_naming_context(domain: &str) -> Self {
        Self::build(domain, None)
    }

    fn build(domain: &str, naming_context: Option<String>) -> Self {
        let dn = parse(domain);
        let mut entry = StoredEntry::new(dn.clone());
        entry.set("objectClass", expand_classes(&["domain".to_string()]));
        entry.sync_rdn();

        let mut state = State {
            naming_context,
            ..State::default()
        };
        state.entries.insert(key(&dn), entry);
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Insert an object directly, bypassing validation and call recording.
    pub async fn with_entry(
        &self,
        dn: &str,
        object_classes: &[&str],
        attributes: &[(&str, &[&str])],
    ) -> &Self {
        let dn = parse(dn);
        let mut entry = StoredEntry::new(dn.clone());
        let classes: Vec<String> = object_classes.iter().map(ToString::to_string).collect();
        entry.set("objectClass", expand_classes(&classes));
        for (name, values) in attributes {
            entry.set(name, values.iter().map(ToString::to_string).collect());
        }
        entry.sync_rdn();
        self.state.write().await.entries.insert(key(&dn), entry);
        self
    }

    /// Overwrite an attribute out of band (empty removes it).
    pub async fn set_values(&self, dn: &str, attribute: &str, values: &[&str]) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.entries.get_mut(&key(&parse(dn))) {
            entry.set(attribute, values.iter().map(ToString::to_string).collect());
        }
    }

    /// Remove an object out of band.
    pub async fn remove(&self, dn: &str) {
        self.state.write().await.entries.remove(&key(&parse(dn)));
    }

    pub async fn contains(&self, dn: &str) -> bool {
        self.state
            .read()
            .await
            .entries
            .contains_key(&key(&parse(dn)))
    }

    pub async fn values(&self, dn: &str, attribute: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .entries
            .get(&key(&parse(dn)))
            .map(|entry| entry.values(attribute).to_vec())
            .unwrap_or_default()
    }

    /// Make the next call of `operation` fail with result code `rc`.
    pub async fn fail_next(&self, operation: &str, rc: u32) {
        self.state.write().await.fail_next = Some((operation.to_string(), rc));
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn reset_calls(&self) {
        self.state.write().await.calls.clear();
    }

    pub async fn write_count(&self) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.is_write())
            .count()
    }

    pub async fn search_count(&self) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| !c.is_write())
            .count()
    }

    /// DNs of all add requests, in order.
    pub async fn added_dns(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Add { dn, .. } => Some(dn.clone()),
                _ => None,
            })
            .collect()
    }

    /// Changes of the most recent modify request against `dn`.
    pub async fn last_modification(&self, dn: &str) -> Vec<Modification> {
        let target = parse(dn);
        self.state
            .read()
            .await
            .calls
            .iter()
            .rev()
            .find_map(|c| match c {
                RecordedCall::Modify { dn, changes } if parse(dn).eq_ignore_case(&target) => {
                    Some(changes.clone())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    /// `(dn, new_rdn, new_superior)` of the most recent modify-DN request.
    pub async fn last_modify_dn(&self) -> Option<(String, String, Option<String>)> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .rev()
            .find_map(|c| match c {
                RecordedCall::ModifyDn {
                    dn,
                    new_rdn,
                    new_superior,
                    ..
                } => Some((dn.clone(), new_rdn.clone(), new_superior.clone())),
                _ => None,
            })
    }

    /// Record `call` and consume an injected failure for it.
    async fn record(&self, call: RecordedCall, target: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let operation = call.operation();
        state.calls.push(call);
        if let Some((op, rc)) = state.fail_next.take() {
            if op == operation {
                return Err(fail(operation, target, rc));
            }
            state.fail_next = Some((op, rc));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryConnection for MemoryDirectory {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>> {
        self.record(RecordedCall::Search(request.clone()), &request.base)
            .await?;
        let state = self.state.read().await;

        // Root DSE
        if request.base.trim().is_empty() && request.scope == SearchScope::Base {
            let mut attributes = std::collections::HashMap::new();
            if let Some(nc) = &state.naming_context {
                attributes.insert("defaultNamingContext".to_string(), vec![nc.clone()]);
            }
            return Ok(vec![RawEntry {
                dn: String::new(),
                attributes,
            }]);
        }

        let base = DistinguishedName::parse(&request.base)
            .map_err(|_| fail("search", &request.base, 34))?;
        if !state.entries.contains_key(&key(&base)) {
            return Err(fail("search", &request.base, 32));
        }
        let filter = filter::parse(&request.filter)
            .map_err(|detail| DirectoryError::protocol("search", &request.base, Some(87), detail))?;

        Ok(state
            .entries
            .values()
            .filter(|entry| in_scope(&base, &entry.dn, request.scope))
            .filter(|entry| filter.matches(entry))
            .map(|entry| entry.to_raw(&request.attributes))
            .collect())
    }

    async fn add(&self, dn: &str, attributes: &[(String, Vec<Vec<u8>>)]) -> Result<()> {
        self.record(
            RecordedCall::Add {
                dn: dn.to_string(),
                attributes: attributes.to_vec(),
            },
            dn,
        )
        .await?;
        let mut state = self.state.write().await;

        let parsed = DistinguishedName::parse(dn).map_err(|_| fail("add", dn, 34))?;
        if state.entries.contains_key(&key(&parsed)) {
            return Err(fail("add", dn, 68));
        }
        let parent = parsed.parent().map_err(|_| fail("add", dn, 34))?;
        if !parent.is_empty() && !state.entries.contains_key(&key(&parent)) {
            return Err(fail("add", dn, 32));
        }

        let mut entry = StoredEntry::new(parsed.clone());
        for (name, values) in attributes {
            if is_secret_attribute(name) {
                continue;
            }
            let values: Vec<String> = values
                .iter()
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect();
            if name.eq_ignore_ascii_case("objectClass") {
                entry.set("objectClass", expand_classes(&values));
            } else {
                entry.set(name, values);
            }
        }
        entry.sync_rdn();
        state.entries.insert(key(&parsed), entry);
        Ok(())
    }

    async fn modify(&self, dn: &str, changes: &[Modification]) -> Result<()> {
        self.record(
            RecordedCall::Modify {
                dn: dn.to_string(),
                changes: changes.to_vec(),
            },
            dn,
        )
        .await?;
        let mut state = self.state.write().await;

        let entry_key = key(&parse(dn));
        let Some(current) = state.entries.get(&entry_key) else {
            return Err(fail("modify", dn, 32));
        };
        // 全部成功才提交
        let mut updated = current.clone();

        for change in changes {
            let name = change.attribute();
            if is_secret_attribute(name) {
                continue;
            }
            let values: Vec<String> = change
                .values()
                .iter()
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect();
            let mut existing = updated.values(name).to_vec();
            match change {
                Modification::Add(..) => {
                    for value in values {
                        if existing.contains(&value) {
                            return Err(fail("modify", dn, 20));
                        }
                        existing.push(value);
                    }
                }
                Modification::Delete(..) if values.is_empty() => {
                    if existing.is_empty() {
                        return Err(fail("modify", dn, 16));
                    }
                    existing.clear();
                }
                Modification::Delete(..) => {
                    for value in &values {
                        let Some(pos) = existing.iter().position(|v| v == value) else {
                            return Err(fail("modify", dn, 16));
                        };
                        existing.remove(pos);
                    }
                }
                Modification::Replace(..) => existing = values,
            }
            updated.set(name, existing);
        }

        state.entries.insert(entry_key, updated);
        Ok(())
    }

    async fn modify_dn(
        &self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
        new_superior: Option<&str>,
    ) -> Result<()> {
        self.record(
            RecordedCall::ModifyDn {
                dn: dn.to_string(),
                new_rdn: new_rdn.to_string(),
                delete_old_rdn,
                new_superior: new_superior.map(ToString::to_string),
            },
            dn,
        )
        .await?;
        let mut state = self.state.write().await;

        let source = parse(dn);
        if !state.entries.contains_key(&key(&source)) {
            return Err(fail("modifyDN", dn, 32));
        }
        let parent = match new_superior {
            Some(sup) => DistinguishedName::parse(sup).map_err(|_| fail("modifyDN", dn, 34))?,
            None => source.parent().map_err(|_| fail("modifyDN", dn, 34))?,
        };
        if !parent.is_empty() && !state.entries.contains_key(&key(&parent)) {
            return Err(fail("modifyDN", dn, 32));
        }
        let rdn = DistinguishedName::parse(new_rdn).map_err(|_| fail("modifyDN", dn, 34))?;
        let target = rdn.concat(&parent);
        if key(&target) != key(&source) && state.entries.contains_key(&key(&target)) {
            return Err(fail("modifyDN", dn, 68));
        }

        // 子树整体移动
        let moved: Vec<String> = state
            .entries
            .values()
            .filter(|e| in_scope(&source, &e.dn, SearchScope::Subtree))
            .map(|e| key(&e.dn))
            .collect();
        for old_key in moved {
            let Some(mut entry) = state.entries.remove(&old_key) else {
                continue;
            };
            let depth = entry.dn.len() - source.len();
            let prefix = DistinguishedName::from_rdns(entry.dn.components()[..depth].to_vec());
            let is_root = depth == 0;
            if is_root && delete_old_rdn {
                if let Some(old_leaf) = source.leaf() {
                    entry.set(old_leaf.attr_type(), Vec::new());
                }
            }
            entry.dn = prefix.concat(&target);
            if is_root {
                entry.sync_rdn();
            }
            state.entries.insert(key(&entry.dn), entry);
        }
        Ok(())
    }

    async fn delete(&self, dn: &str) -> Result<()> {
        self.record(RecordedCall::Delete { dn: dn.to_string() }, dn)
            .await?;
        let mut state = self.state.write().await;

        let target = parse(dn);
        if !state.entries.contains_key(&key(&target)) {
            return Err(fail("delete", dn, 32));
        }
        let has_children = state
            .entries
            .values()
            .any(|e| in_scope(&target, &e.dn, SearchScope::OneLevel));
        if has_children {
            return Err(fail("delete", dn, 66));
        }
        state.entries.remove(&key(&target));
        Ok(())
    }
}

// ===== Filter evaluation =====

/// Enough of RFC 4515 for the filters this crate sends: `&`, `|`, `!`,
/// equality, presence and substrings. Matching is case-insensitive.
mod filter {
    use super::StoredEntry;
    use crate::dn::DistinguishedName;

    #[derive(Debug)]
    pub(super) enum Filter {
        And(Vec<Filter>),
        Or(Vec<Filter>),
        Not(Box<Filter>),
        Present(String),
        Equal(String, String),
        Substring(String, Vec<String>),
    }

    pub(super) fn parse(text: &str) -> Result<Filter, String> {
        let mut parser = Parser {
            bytes: text.trim().as_bytes(),
            pos: 0,
        };
        let filter = parser.filter()?;
        if parser.pos != parser.bytes.len() {
            return Err(format!("trailing characters in filter {text}"));
        }
        Ok(filter)
    }

    struct Parser<'a> {
        bytes: &'a [u8],
        pos: usize,
    }

    impl Parser<'_> {
        fn expect(&mut self, b: u8) -> Result<(), String> {
            if self.bytes.get(self.pos) == Some(&b) {
                self.pos += 1;
                Ok(())
            } else {
                Err(format!("expected '{}' at offset {}", b as char, self.pos))
            }
        }

        fn filter(&mut self) -> Result<Filter, String> {
            self.expect(b'(')?;
            let filter = match self.bytes.get(self.pos) {
                Some(b'&') => {
                    self.pos += 1;
                    Filter::And(self.list()?)
                }
                Some(b'|') => {
                    self.pos += 1;
                    Filter::Or(self.list()?)
                }
                Some(b'!') => {
                    self.pos += 1;
                    Filter::Not(Box::new(self.filter()?))
                }
                _ => self.item()?,
            };
            self.expect(b')')?;
            Ok(filter)
        }

        fn list(&mut self) -> Result<Vec<Filter>, String> {
            let mut out = Vec::new();
            while self.bytes.get(self.pos) == Some(&b'(') {
                out.push(self.filter()?);
            }
            Ok(out)
        }

        fn item(&mut self) -> Result<Filter, String> {
            let start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b')' {
                self.pos += 1;
            }
            let raw = std::str::from_utf8(&self.bytes[start..self.pos])
                .map_err(|e| e.to_string())?;
            let (attr, value) = raw
                .split_once('=')
                .ok_or_else(|| format!("missing '=' in filter item {raw}"))?;
            if attr.is_empty() || attr.ends_with(['~', '<', '>', ':']) {
                return Err(format!("unsupported filter item {raw}"));
            }
            if value == "*" {
                return Ok(Filter::Present(attr.to_string()));
            }
            let parts = value
                .split('*')
                .map(unescape)
                .collect::<Result<Vec<_>, _>>()?;
            if parts.len() == 1 {
                Ok(Filter::Equal(attr.to_string(), parts.into_iter().collect()))
            } else {
                Ok(Filter::Substring(attr.to_string(), parts))
            }
        }
    }

    fn unescape(text: &str) -> Result<String, String> {
        let bytes = text.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\\' {
                let hex = text
                    .get(i + 1..i + 3)
                    .ok_or_else(|| format!("bad escape in {text}"))?;
                out.push(u8::from_str_radix(hex, 16).map_err(|e| e.to_string())?);
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).map_err(|e| e.to_string())
    }

    impl Filter {
        pub(super) fn matches(&self, entry: &StoredEntry) -> bool {
            match self {
                Self::And(items) => items.iter().all(|f| f.matches(entry)),
                Self::Or(items) => items.iter().any(|f| f.matches(entry)),
                Self::Not(inner) => !inner.matches(entry),
                Self::Present(attr) => {
                    attr.eq_ignore_ascii_case("distinguishedName")
                        || !entry.values(attr).is_empty()
                }
                Self::Equal(attr, value) if attr.eq_ignore_ascii_case("distinguishedName") => {
                    DistinguishedName::parse(value).is_ok_and(|dn| dn.eq_ignore_case(&entry.dn))
                }
                Self::Equal(attr, value) => {
                    let value = value.to_lowercase();
                    entry.values(attr).iter().any(|v| v.to_lowercase() == value)
                }
                Self::Substring(attr, parts) => entry
                    .values(attr)
                    .iter()
                    .any(|v| substring_match(&v.to_lowercase(), parts)),
            }
        }
    }

    fn substring_match(value: &str, parts: &[String]) -> bool {
        let parts: Vec<String> = parts.iter().map(|p| p.to_lowercase()).collect();
        let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
            return false;
        };
        if !value.starts_with(first.as_str()) {
            return false;
        }
        let mut rest = &value[first.len()..];
        for middle in &parts[1..parts.len() - 1] {
            match rest.find(middle.as_str()) {
                Some(pos) => rest = &rest[pos + middle.len()..],
                None => return false,
            }
        }
        rest.len() >= last.len() && rest.ends_with(last.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "DC=example,DC=com";

    fn req(base: &str, scope: SearchScope, filter: &str) -> SearchRequest {
        SearchRequest::new(base, scope, filter, vec!["*".to_string()])
    }

    #[tokio::test]
    async fn root_dse_reports_naming_context() {
        let directory = MemoryDirectory::new(BASE);
        let entries = directory
            .search(&req("", SearchScope::Base, "(objectClass=*)"))
            .await
            .unwrap();
        assert_eq!(
            entries[0].attributes["defaultNamingContext"],
            vec![BASE.to_string()]
        );
    }

    #[tokio::test]
    async fn filters_and_scopes() {
        let directory = MemoryDirectory::new(BASE);
        directory
            .with_entry("OU=A,DC=example,DC=com", &["organizationalUnit"], &[])
            .await
            .with_entry(
                "CN=Alice,OU=A,DC=example,DC=com",
                &["user"],
                &[("sAMAccountName", &["alice"])],
            )
            .await;

        let users = directory
            .search(&req(
                BASE,
                SearchScope::Subtree,
                "(&(objectClass=person)(sAMAccountName=ALICE))",
            ))
            .await
            .unwrap();
        assert_eq!(users.len(), 1);

        let one_level = directory
            .search(&req(BASE, SearchScope::OneLevel, "(objectClass=*)"))
            .await
            .unwrap();
        assert_eq!(one_level.len(), 1);

        let by_dn = directory
            .search(&req(
                BASE,
                SearchScope::Subtree,
                "(distinguishedName=cn=alice,ou=a,dc=example,dc=com)",
            ))
            .await
            .unwrap();
        assert_eq!(by_dn.len(), 1);

        let substring = directory
            .search(&req(BASE, SearchScope::Subtree, "(sAMAccountName=al*e)"))
            .await
            .unwrap();
        assert_eq!(substring.len(), 1);

        let negated = directory
            .search(&req(BASE, SearchScope::Subtree, "(!(objectClass=user))"))
            .await
            .unwrap();
        assert_eq!(negated.len(), 2);
    }

    #[tokio::test]
    async fn result_codes_match_a_server() {
        let directory = MemoryDirectory::new(BASE);
        let code = |r: Result<()>| match r {
            Err(DirectoryError::Protocol { result_code, .. }) => result_code,
            _ => None,
        };

        assert_eq!(code(directory.add("CN=x,OU=Missing,DC=example,DC=com", &[]).await), Some(32));
        directory.add("OU=A,DC=example,DC=com", &[]).await.unwrap();
        assert_eq!(code(directory.add("ou=a,dc=example,dc=com", &[]).await), Some(68));
        assert_eq!(code(directory.delete(BASE).await), Some(66));
        assert_eq!(
            code(
                directory
                    .modify(
                        "OU=A,DC=example,DC=com",
                        &[Modification::delete("description", ["nope"])]
                    )
                    .await
            ),
            Some(16)
        );
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let directory = MemoryDirectory::new(BASE);
        directory.fail_next("delete", 50).await;
        assert!(directory.search(&req(BASE, SearchScope::Base, "(objectClass=*)")).await.is_ok());
        directory.add("OU=A,DC=example,DC=com", &[]).await.unwrap();
        assert!(directory.delete("OU=A,DC=example,DC=com").await.is_err());
        assert!(directory.delete("OU=A,DC=example,DC=com").await.is_ok());
    }
}
