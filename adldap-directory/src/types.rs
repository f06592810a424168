use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

// ============ Search ============

/// Search scope, relative to the base DN of a [`SearchRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchScope {
    /// The base object only.
    Base,
    /// Immediate children of the base object.
    OneLevel,
    /// The base object and all its descendants.
    Subtree,
}

/// A single search round trip.
///
/// Aliases are never dereferenced and no size or time limit is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Base DN; the empty string addresses the root DSE.
    pub base: String,
    /// Search scope.
    pub scope: SearchScope,
    /// RFC 4515 filter string.
    pub filter: String,
    /// Attributes to return. `["1.1"]` requests none, an empty list requests all.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(
        base: impl Into<String>,
        scope: SearchScope,
        filter: impl Into<String>,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            base: base.into(),
            scope,
            filter: filter.into(),
            attributes,
        }
    }
}

/// One entry returned by a search, with attribute names as sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry DN as returned by the server.
    pub dn: String,
    /// Attribute values keyed by attribute name.
    pub attributes: HashMap<String, Vec<String>>,
}

// ============ Writes ============

/// One change inside a modify request.
///
/// Values are raw bytes because some attributes (the credential attribute in
/// particular) are not strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    /// Add values to the attribute.
    Add(String, Vec<Vec<u8>>),
    /// Remove the listed values, or the whole attribute when the list is empty.
    Delete(String, Vec<Vec<u8>>),
    /// Replace all values of the attribute.
    Replace(String, Vec<Vec<u8>>),
}

impl Modification {
    /// Build from string values.
    pub fn add<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Add(attribute.into(), to_bytes(values))
    }

    /// Build from string values.
    pub fn delete<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Delete(attribute.into(), to_bytes(values))
    }

    /// Build from string values.
    pub fn replace<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Replace(attribute.into(), to_bytes(values))
    }

    /// Attribute this change applies to.
    pub fn attribute(&self) -> &str {
        match self {
            Self::Add(attr, _) | Self::Delete(attr, _) | Self::Replace(attr, _) => attr,
        }
    }

    pub fn values(&self) -> &[Vec<u8>] {
        match self {
            Self::Add(_, values) | Self::Delete(_, values) | Self::Replace(_, values) => values,
        }
    }
}

fn to_bytes<I, S>(values: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(|v| v.into().into_bytes()).collect()
}

/// Attribute name to values, as supplied by callers that create objects.
///
/// Ordered so that the resulting add request is deterministic.
pub type AttributeMap = BTreeMap<String, Vec<String>>;

// ============ Accounts ============

/// Object class of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountClass {
    User,
    Computer,
}

impl AccountClass {
    /// `objectClass` value used in filters and add requests.
    pub fn object_class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Computer => "computer",
        }
    }
}

impl std::fmt::Display for AccountClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.object_class())
    }
}
