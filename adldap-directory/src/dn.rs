//! Distinguished-name algebra.
//!
//! Parses RFC 4514 string DNs into an ordered list of relative components
//! (most specific first) and provides the arithmetic the entry layer needs:
//! parent, leaf RDN, concatenation, equality and ancestry. No I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DirectoryError, Result};

/// One `type=value` pair inside a relative distinguished name.
///
/// `value` is stored unescaped; escaping is applied again on serialization.
#[derive(Debug, Clone)]
pub struct AttributeTypeAndValue {
    /// Attribute type as written (`CN`, `ou`, `2.5.4.3`, ...).
    pub attr_type: String,
    /// Unescaped attribute value.
    pub value: String,
}

impl AttributeTypeAndValue {
    pub fn new(attr_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attr_type: attr_type.into(),
            value: value.into(),
        }
    }

    fn equal(&self, other: &Self) -> bool {
        self.attr_type.eq_ignore_ascii_case(&other.attr_type) && self.value == other.value
    }

    fn equal_fold(&self, other: &Self) -> bool {
        self.attr_type.eq_ignore_ascii_case(&other.attr_type)
            && self.value.to_lowercase() == other.value.to_lowercase()
    }
}

impl fmt::Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attr_type, escape_value(&self.value))
    }
}

/// A relative distinguished name: one or more `type=value` pairs joined by `+`.
#[derive(Debug, Clone)]
pub struct RelativeDn {
    attributes: Vec<AttributeTypeAndValue>,
}

impl RelativeDn {
    /// A single-valued RDN such as `CN=alice`.
    pub fn new(attr_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attributes: vec![AttributeTypeAndValue::new(attr_type, value)],
        }
    }

    pub fn attributes(&self) -> &[AttributeTypeAndValue] {
        &self.attributes
    }

    /// Type of the first pair.
    pub fn attr_type(&self) -> &str {
        self.attributes
            .first()
            .map_or("", |atv| atv.attr_type.as_str())
    }

    /// Value of the first pair.
    pub fn value(&self) -> &str {
        self.attributes.first().map_or("", |atv| atv.value.as_str())
    }

    // 多值 RDN 的属性顺序无关
    fn equal_by(
        &self,
        other: &Self,
        eq: fn(&AttributeTypeAndValue, &AttributeTypeAndValue) -> bool,
    ) -> bool {
        self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|a| other.attributes.iter().any(|b| eq(a, b)))
            && other
                .attributes
                .iter()
                .all(|b| self.attributes.iter().any(|a| eq(a, b)))
    }
}

impl PartialEq for RelativeDn {
    fn eq(&self, other: &Self) -> bool {
        self.equal_by(other, AttributeTypeAndValue::equal)
    }
}

impl Eq for RelativeDn {}

impl fmt::Display for RelativeDn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atv) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{atv}")?;
        }
        Ok(())
    }
}

/// An ordered sequence of relative components, most specific first.
///
/// Equality compares components in order, attribute types case-insensitively and
/// values exactly. [`eq_ignore_case`](Self::eq_ignore_case) also folds value case,
/// which is how Active Directory itself matches names.
///
/// The empty DN is representable (it is the parent of a one-component DN and the
/// base of the root DSE); operations that need a component fail on it with
/// [`DirectoryError::EmptyDn`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    rdns: Vec<RelativeDn>,
}

impl DistinguishedName {
    /// Parse a string DN. Empty (or all-whitespace) input yields the empty DN.
    pub fn parse(text: &str) -> Result<Self> {
        Parser::new(text).parse()
    }

    /// The empty DN.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rdns(rdns: Vec<RelativeDn>) -> Self {
        Self { rdns }
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Number of relative components.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn components(&self) -> &[RelativeDn] {
        &self.rdns
    }

    /// Leaf component, if any.
    pub fn leaf(&self) -> Option<&RelativeDn> {
        self.rdns.first()
    }

    /// Value of the leaf component (`alice` for `CN=alice,...`).
    pub fn name(&self) -> Option<&str> {
        self.leaf().map(RelativeDn::value)
    }

    /// Everything but the leaf component.
    ///
    /// A one-component DN has the empty DN as parent; the empty DN itself has no
    /// parent and yields [`DirectoryError::EmptyDn`].
    pub fn parent(&self) -> Result<Self> {
        if self.rdns.is_empty() {
            return Err(DirectoryError::EmptyDn {
                operation: "parent".to_string(),
            });
        }
        Ok(Self {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// The leaf component alone, as a DN.
    pub fn rdn(&self) -> Result<Self> {
        match self.rdns.first() {
            Some(leaf) => Ok(Self {
                rdns: vec![leaf.clone()],
            }),
            None => Err(DirectoryError::EmptyDn {
                operation: "rdn".to_string(),
            }),
        }
    }

    /// `self` followed by the components of `suffix` (`rdn.concat(parent)`).
    #[must_use]
    pub fn concat(&self, suffix: &Self) -> Self {
        let mut rdns = Vec::with_capacity(self.rdns.len() + suffix.rdns.len());
        rdns.extend(self.rdns.iter().cloned());
        rdns.extend(suffix.rdns.iter().cloned());
        Self { rdns }
    }

    /// A new DN with `rdn` prepended to `self`.
    #[must_use]
    pub fn child(&self, rdn: RelativeDn) -> Self {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Self { rdns }
    }

    /// True if `self` is a strict suffix of `other`.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        if self.rdns.len() >= other.rdns.len() {
            return false;
        }
        let offset = other.rdns.len() - self.rdns.len();
        self.rdns
            .iter()
            .zip(&other.rdns[offset..])
            .all(|(a, b)| a == b)
    }

    /// [`is_ancestor_of`](Self::is_ancestor_of) with types and values compared
    /// case-insensitively, the way the directory matches DNs.
    pub fn is_ancestor_of_ignore_case(&self, other: &Self) -> bool {
        if self.rdns.len() >= other.rdns.len() {
            return false;
        }
        let offset = other.rdns.len() - self.rdns.len();
        self.rdns
            .iter()
            .zip(&other.rdns[offset..])
            .all(|(a, b)| a.equal_by(b, AttributeTypeAndValue::equal_fold))
    }

    /// Component-wise equality with values compared case-insensitively as well.
    pub fn eq_ignore_case(&self, other: &Self) -> bool {
        self.rdns.len() == other.rdns.len()
            && self
                .rdns
                .iter()
                .zip(&other.rdns)
                .all(|(a, b)| a.equal_by(b, AttributeTypeAndValue::equal_fold))
    }

    /// Whether the leaf component's type is `attr_type` (case-insensitive).
    pub fn leaf_type_is(&self, attr_type: &str) -> bool {
        self.leaf()
            .is_some_and(|rdn| rdn.attr_type().eq_ignore_ascii_case(attr_type))
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl FromStr for DistinguishedName {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DistinguishedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ============ Escaping ============

const SPECIAL: &[char] = &['"', '+', ',', ';', '<', '>', '\\'];

/// Escape an attribute value per RFC 4514 §2.4.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        let needs_escape = SPECIAL.contains(&c)
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if c == '\0' {
            out.push_str("\\00");
        } else if needs_escape {
            out.push('\\');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

// ============ Parser ============

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, detail: impl Into<String>) -> DirectoryError {
        DirectoryError::InvalidDn {
            dn: self.input.to_string(),
            detail: detail.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<DistinguishedName> {
        if self.input.trim().is_empty() {
            return Ok(DistinguishedName::empty());
        }

        let mut rdns = Vec::new();
        let mut attributes = Vec::new();

        loop {
            let attr_type = self.parse_type()?;
            let value = self.parse_value()?;
            attributes.push(AttributeTypeAndValue { attr_type, value });

            match self.peek() {
                None => {
                    rdns.push(RelativeDn {
                        attributes: std::mem::take(&mut attributes),
                    });
                    break;
                }
                Some(b'+') => {
                    self.pos += 1;
                }
                Some(b',' | b';') => {
                    self.pos += 1;
                    rdns.push(RelativeDn {
                        attributes: std::mem::take(&mut attributes),
                    });
                }
                Some(other) => {
                    return Err(self.error(format!(
                        "unexpected character '{}' at offset {}",
                        other as char, self.pos
                    )));
                }
            }
        }

        Ok(DistinguishedName { rdns })
    }

    fn parse_type(&mut self) -> Result<String> {
        self.skip_spaces();
        let start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b'=' => break,
                b',' | b';' | b'+' => {
                    return Err(if self.pos == start {
                        self.error(format!("empty component at offset {}", self.pos))
                    } else {
                        self.error(format!("missing '=' in component at offset {start}"))
                    });
                }
                _ => self.pos += 1,
            }
        }
        if self.peek().is_none() {
            return Err(self.error(format!("missing '=' in component at offset {start}")));
        }

        let attr_type = self.input[start..self.pos].trim();
        // skip '='
        self.pos += 1;

        if attr_type.is_empty() {
            return Err(self.error(format!("empty attribute type at offset {start}")));
        }
        if !is_valid_attr_type(attr_type) {
            return Err(self.error(format!("invalid attribute type \"{attr_type}\"")));
        }
        Ok(attr_type.to_string())
    }

    fn parse_value(&mut self) -> Result<String> {
        self.skip_spaces();
        if self.peek() == Some(b'#') {
            return Err(self.error("hex-encoded attribute values are not supported"));
        }

        let mut buf: Vec<u8> = Vec::new();
        // 末尾未转义空格需要去掉，转义过的保留
        let mut significant = 0;

        while let Some(b) = self.peek() {
            match b {
                b',' | b';' | b'+' => break,
                b'\\' => {
                    self.pos += 1;
                    let Some(next) = self.peek() else {
                        return Err(self.error("unbalanced escape at end of input"));
                    };
                    if next.is_ascii_hexdigit() {
                        let hi = next;
                        let lo = self.bytes.get(self.pos + 1).copied();
                        match lo {
                            Some(lo) if lo.is_ascii_hexdigit() => {
                                buf.push(hex_value(hi) << 4 | hex_value(lo));
                                self.pos += 2;
                            }
                            _ => {
                                return Err(self.error(format!(
                                    "incomplete hex escape at offset {}",
                                    self.pos - 1
                                )));
                            }
                        }
                    } else if matches!(
                        next,
                        b' ' | b'"' | b'#' | b'+' | b',' | b';' | b'<' | b'=' | b'>' | b'\\'
                    ) {
                        buf.push(next);
                        self.pos += 1;
                    } else {
                        return Err(self.error(format!(
                            "invalid escape sequence at offset {}",
                            self.pos - 1
                        )));
                    }
                    significant = buf.len();
                }
                b'"' => {
                    return Err(self.error(format!("unescaped '\"' at offset {}", self.pos)));
                }
                _ => {
                    buf.push(b);
                    self.pos += 1;
                    if b != b' ' {
                        significant = buf.len();
                    }
                }
            }
        }

        buf.truncate(significant);
        if buf.is_empty() {
            return Err(self.error(format!("empty attribute value before offset {}", self.pos)));
        }

        String::from_utf8(buf).map_err(|_| self.error("attribute value is not valid UTF-8"))
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

/// `descr` (letter, then letters/digits/hyphens) or a dotted numeric OID.
fn is_valid_attr_type(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() => bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-'),
        Some(b) if b.is_ascii_digit() => {
            s.split('.')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        }
        _ => false,
    }
}
