//! Session-scoped gateway to the directory.

use std::sync::Arc;

use crate::account::{Account, AccountControl};
use crate::connection::{ConnectionSettings, LdapConnection};
use crate::dn::{DistinguishedName, RelativeDn};
use crate::entry::Entry;
use crate::error::{DirectoryError, Result};
use crate::ou::OrganizationalUnit;
use crate::traits::DirectoryConnection;
use crate::types::{AccountClass, AttributeMap, RawEntry, SearchRequest, SearchScope};

/// Object classes that may hold other objects.
const CONTAINER_CLASSES: &[&str] = &["organizationalUnit", "container", "domain", "builtinDomain"];

/// Wildcard object class used by lookups that accept any kind of object.
pub const ANY_CLASS: &str = "*";

/// A bound connection plus the search base every lookup is rooted at.
///
/// Cheap to clone; entries keep a clone so they can issue their own requests.
/// The client adds no synchronization of its own: whether concurrent calls are
/// safe depends on the [`DirectoryConnection`] underneath.
#[derive(Clone)]
pub struct DirectoryClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    connection: Box<dyn DirectoryConnection>,
    search_base: DistinguishedName,
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("search_base", &self.inner.search_base.to_string())
            .finish_non_exhaustive()
    }
}

impl DirectoryClient {
    /// Dial, bind and resolve the search base.
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        if settings.url.trim().is_empty() {
            return Err(DirectoryError::Connection {
                url: String::new(),
                detail: "no url provided for LDAP client".to_string(),
            });
        }
        let connection = LdapConnection::connect(settings).await?;
        Self::with_connection(connection, settings.search_base.as_deref()).await
    }

    /// Wrap an already bound connection.
    ///
    /// An unset or blank `search_base` is detected from the root DSE; failure to
    /// detect is reported here rather than on first use.
    pub async fn with_connection(
        connection: impl DirectoryConnection + 'static,
        search_base: Option<&str>,
    ) -> Result<Self> {
        let search_base = match search_base.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => DistinguishedName::parse(text)?,
            None => Self::detect_search_base(&connection).await?,
        };
        if search_base.is_empty() {
            return Err(DirectoryError::SearchBaseUndetectable {
                detail: "search base is empty".to_string(),
            });
        }

        log::debug!("Using search base \"{search_base}\"");
        Ok(Self {
            inner: Arc::new(ClientInner {
                connection: Box::new(connection),
                search_base,
            }),
        })
    }

    /// Read `defaultNamingContext` from the root DSE.
    pub async fn detect_search_base(
        connection: &dyn DirectoryConnection,
    ) -> Result<DistinguishedName> {
        let request = SearchRequest::new(
            "",
            SearchScope::Base,
            "(objectClass=*)",
            vec!["defaultNamingContext".to_string()],
        );
        let entries = connection.search(&request).await.map_err(|e| {
            DirectoryError::SearchBaseUndetectable {
                detail: e.to_string(),
            }
        })?;

        let value = entries
            .into_iter()
            .next()
            .and_then(|entry| first_value(&entry, "defaultNamingContext"))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| DirectoryError::SearchBaseUndetectable {
                detail: "root DSE did not return defaultNamingContext".to_string(),
            })?;

        let search_base = DistinguishedName::parse(&value)?;
        log::info!("Detected search base \"{search_base}\"");
        Ok(search_base)
    }

    pub fn search_base(&self) -> &DistinguishedName {
        &self.inner.search_base
    }

    pub fn connection(&self) -> &dyn DirectoryConnection {
        self.inner.connection.as_ref()
    }

    // ============ Lookup ============

    /// Subtree search rooted at the search base.
    pub async fn search(&self, filter: &str, attributes: &[&str]) -> Result<Vec<RawEntry>> {
        let request = SearchRequest::new(
            self.search_base().to_string(),
            SearchScope::Subtree,
            filter,
            attributes.iter().map(ToString::to_string).collect(),
        );
        self.connection().search(&request).await
    }

    /// Whether exactly one object of `object_class` is named `name`.
    ///
    /// `name` is a DN when it contains `=`, otherwise a sAMAccountName. More than
    /// one match is reported as [`DirectoryError::AmbiguousResult`].
    pub async fn object_exists(&self, name: &str, object_class: &str) -> Result<bool> {
        let match_attribute = match_attribute_for(name);
        let entries = self
            .search(
                &lookup_filter(object_class, match_attribute, name),
                &[crate::cache::NO_ATTRIBUTES],
            )
            .await?;
        match entries.len() {
            0 => Ok(false),
            1 => Ok(true),
            count => Err(ambiguous(object_class, name, count)),
        }
    }

    /// The single object of `object_class` whose `match_attribute` equals `value`.
    pub async fn get_entry_by_filter(
        &self,
        value: &str,
        match_attribute: &str,
        object_class: &str,
        attributes: &[&str],
    ) -> Result<Entry> {
        let cache_request = crate::cache::AttributeCache::new().request_list(attributes);
        let requested: Vec<&str> = cache_request.iter().map(String::as_str).collect();
        let mut entries = self
            .search(
                &lookup_filter(object_class, match_attribute, value),
                &requested,
            )
            .await?;

        match entries.len() {
            0 => Err(DirectoryError::NotFound {
                object_class: object_class.to_string(),
                name: value.to_string(),
            }),
            1 => {
                let raw = entries.remove(0);
                Entry::from_search(self.clone(), raw, &cache_request)
            }
            count => Err(ambiguous(object_class, value, count)),
        }
    }

    /// Look up by sAMAccountName, or by DN when `name` contains `=`.
    pub async fn get_object_by_name(
        &self,
        name: &str,
        object_class: &str,
        attributes: &[&str],
    ) -> Result<Entry> {
        self.get_entry_by_filter(name, match_attribute_for(name), object_class, attributes)
            .await
    }

    pub async fn get_object_by_dn(
        &self,
        dn: &DistinguishedName,
        object_class: &str,
        attributes: &[&str],
    ) -> Result<Entry> {
        self.get_entry_by_filter(
            &dn.to_string(),
            "distinguishedName",
            object_class,
            attributes,
        )
        .await
    }

    /// Whether `dn` names an organizational unit, container or domain object.
    pub async fn container_exists(&self, dn: &DistinguishedName) -> Result<bool> {
        let classes = CONTAINER_CLASSES
            .iter()
            .map(|class| format!("(objectClass={class})"))
            .collect::<String>();
        let filter = format!(
            "(&(|{classes})(distinguishedName={}))",
            ldap3::ldap_escape(dn.to_string())
        );
        let entries = self.search(&filter, &[crate::cache::NO_ATTRIBUTES]).await?;
        match entries.len() {
            0 => Ok(false),
            1 => Ok(true),
            count => Err(ambiguous("container", &dn.to_string(), count)),
        }
    }

    pub async fn get_account(&self, name: &str, class: AccountClass) -> Result<Account> {
        let entry = self
            .get_object_by_name(name, class.object_class(), &[])
            .await?;
        Ok(Account::new(entry, class))
    }

    pub async fn get_organizational_unit(
        &self,
        dn: &DistinguishedName,
    ) -> Result<OrganizationalUnit> {
        let entry = self
            .get_object_by_dn(dn, "organizationalUnit", &[])
            .await?;
        Ok(OrganizationalUnit::new(entry))
    }

    // ============ Create / delete ============

    /// Add an object and return it as read back from the server.
    pub async fn create_object(
        &self,
        dn: &DistinguishedName,
        object_class: &str,
        attributes: &AttributeMap,
    ) -> Result<Entry> {
        if dn.is_empty() {
            return Err(DirectoryError::EmptyDn {
                operation: "create".to_string(),
            });
        }
        let dn_text = dn.to_string();
        if self.object_exists(&dn_text, ANY_CLASS).await? {
            return Err(DirectoryError::AlreadyExists { name: dn_text });
        }

        let mut request: Vec<(String, Vec<Vec<u8>>)> = Vec::with_capacity(attributes.len() + 1);
        request.push((
            "objectClass".to_string(),
            vec![object_class.as_bytes().to_vec()],
        ));
        for (name, values) in attributes {
            if name.eq_ignore_ascii_case("objectClass") || values.is_empty() {
                continue;
            }
            request.push((
                name.clone(),
                values.iter().map(|v| v.as_bytes().to_vec()).collect(),
            ));
        }

        self.connection().add(&dn_text, &request).await?;
        log::info!("Created {object_class} object \"{dn_text}\"");

        let names: Vec<&str> = attributes.keys().map(String::as_str).collect();
        self.get_object_by_dn(dn, object_class, &names).await
    }

    /// Create one organizational unit whose parent already exists.
    ///
    /// The leaf must be an `OU=` component, `dn` must lie below the search base,
    /// and the parent must be the search base itself or an existing container.
    pub async fn create_organizational_unit(
        &self,
        dn: &DistinguishedName,
    ) -> Result<OrganizationalUnit> {
        self.check_ou_placement(dn)?;

        let parent = dn.parent()?;
        if !parent.eq_ignore_case(self.search_base()) && !self.container_exists(&parent).await? {
            return Err(DirectoryError::ContainerNotFound {
                dn: dn.to_string(),
                container: parent.to_string(),
            });
        }

        let entry = self
            .create_object(dn, "organizationalUnit", &AttributeMap::new())
            .await?;
        Ok(OrganizationalUnit::new(entry))
    }

    /// Create an organizational unit along with any missing `OU=` ancestors.
    ///
    /// Walks upward at most as many levels as `dn` is deeper than the search base,
    /// then creates the missing ancestors top-down. Not transactional: a failure
    /// part-way leaves the ancestors created so far in place.
    pub async fn create_organizational_unit_recursive(
        &self,
        dn: &DistinguishedName,
    ) -> Result<OrganizationalUnit> {
        self.check_ou_placement(dn)?;

        let base = self.search_base();
        let depth = dn.len().saturating_sub(base.len());
        let mut missing = Vec::new();
        let mut current = dn.parent()?;

        for _ in 0..depth {
            if current.eq_ignore_case(base) || self.container_exists(&current).await? {
                break;
            }
            if !current.leaf_type_is("OU") {
                return Err(DirectoryError::ContainerNotFound {
                    dn: dn.to_string(),
                    container: current.to_string(),
                });
            }
            let next = current.parent()?;
            missing.push(current);
            current = next;
        }

        for ancestor in missing.iter().rev() {
            log::info!("Creating missing parent organizational unit \"{ancestor}\"");
            self.create_organizational_unit(ancestor).await?;
        }
        self.create_organizational_unit(dn).await
    }

    /// Create a user or computer account in `container`.
    ///
    /// The leaf is `CN=<name>`, taken from the `name` or `displayName` attribute,
    /// else the account name with one trailing `$` removed. The account-control
    /// attribute is set to `initial_flags`; credentials are left to the caller.
    pub async fn create_account(
        &self,
        sam_account_name: &str,
        container: &DistinguishedName,
        attributes: &AttributeMap,
        class: AccountClass,
        initial_flags: AccountControl,
    ) -> Result<Account> {
        if self.object_exists(sam_account_name, ANY_CLASS).await? {
            return Err(DirectoryError::AlreadyExists {
                name: sam_account_name.to_string(),
            });
        }

        let cn = leaf_name(sam_account_name, attributes);
        let dn = container.child(RelativeDn::new("CN", cn));
        if !self.container_exists(container).await? {
            return Err(DirectoryError::ContainerNotFound {
                dn: dn.to_string(),
                container: container.to_string(),
            });
        }

        let mut attributes = attributes.clone();
        attributes.insert(
            "sAMAccountName".to_string(),
            vec![sam_account_name.to_string()],
        );
        attributes.insert(
            "userAccountControl".to_string(),
            vec![initial_flags.bits().to_string()],
        );

        let entry = self
            .create_object(&dn, class.object_class(), &attributes)
            .await?;
        Ok(Account::new(entry, class))
    }

    /// Delete `dn` if it exists; returns whether a delete was issued.
    pub async fn delete_object(&self, dn: &DistinguishedName, object_class: &str) -> Result<bool> {
        let dn_text = dn.to_string();
        if !self.object_exists(&dn_text, object_class).await? {
            log::debug!("{object_class} object \"{dn_text}\" already absent");
            return Ok(false);
        }
        self.connection().delete(&dn_text).await?;
        log::info!("Deleted {object_class} object \"{dn_text}\"");
        Ok(true)
    }

    fn check_ou_placement(&self, dn: &DistinguishedName) -> Result<()> {
        if !dn.leaf_type_is("OU") {
            return Err(DirectoryError::UnexpectedObjectType {
                dn: dn.to_string(),
                expected: "OU".to_string(),
            });
        }
        if !self.search_base().is_ancestor_of_ignore_case(dn) {
            return Err(DirectoryError::OutsideSearchBase {
                dn: dn.to_string(),
                search_base: self.search_base().to_string(),
            });
        }
        Ok(())
    }
}

/// `distinguishedName` when `name` looks like `x=y`, otherwise `sAMAccountName`.
pub(crate) fn match_attribute_for(name: &str) -> &'static str {
    let looks_like_dn = name
        .char_indices()
        .any(|(i, c)| c == '=' && i > 0 && i + 1 < name.len());
    if looks_like_dn {
        "distinguishedName"
    } else {
        "sAMAccountName"
    }
}

/// `(&(objectClass=<class>)(<attr>=<value>))`, with the value escaped.
pub(crate) fn lookup_filter(object_class: &str, match_attribute: &str, value: &str) -> String {
    let class = if object_class == ANY_CLASS {
        ANY_CLASS.to_string()
    } else {
        ldap3::ldap_escape(object_class).into_owned()
    };
    format!(
        "(&(objectClass={class})({match_attribute}={}))",
        ldap3::ldap_escape(value)
    )
}

pub(crate) fn first_value(entry: &RawEntry, name: &str) -> Option<String> {
    entry
        .attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first().cloned())
}

fn ambiguous(object_class: &str, name: &str, count: usize) -> DirectoryError {
    DirectoryError::AmbiguousResult {
        object_class: object_class.to_string(),
        name: name.to_string(),
        count,
    }
}

fn leaf_name(sam_account_name: &str, attributes: &AttributeMap) -> String {
    ["name", "displayName"]
        .iter()
        .find_map(|key| {
            attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .and_then(|(_, values)| values.first())
                .filter(|v| !v.is_empty())
                .cloned()
        })
        .unwrap_or_else(|| {
            sam_account_name
                .strip_suffix('$')
                .unwrap_or(sam_account_name)
                .to_string()
        })
}
