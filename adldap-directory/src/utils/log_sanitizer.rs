//! Log sanitization utilities
//!
//! Credential attributes must never reach a log line, and multi-valued
//! attributes (member lists, SPN sets) can be arbitrarily long.

use crate::types::Modification;

/// Maximum number of characters to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Attributes whose values are replaced by a placeholder in logs.
const SECRET_ATTRIBUTES: &[&str] = &["unicodePwd", "userPassword", "ntPwdHistory", "dBCSPwd"];

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Whether values of `attribute` are secret.
pub fn is_secret_attribute(attribute: &str) -> bool {
    SECRET_ATTRIBUTES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(attribute))
}

/// Render an attribute's values for a log line.
pub fn values_for_log(attribute: &str, values: &[impl AsRef<[u8]>]) -> String {
    if is_secret_attribute(attribute) {
        return format!("<{} value(s) masked>", values.len());
    }
    let joined = values
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(", ");
    truncate_for_log(&format!("[{joined}]"))
}

/// One-line description of a modify request.
pub fn changes_for_log(changes: &[Modification]) -> String {
    changes
        .iter()
        .map(|change| {
            let op = match change {
                Modification::Add(..) => "add",
                Modification::Delete(..) => "delete",
                Modification::Replace(..) => "replace",
            };
            format!(
                "{op} {}={}",
                change.attribute(),
                values_for_log(change.attribute(), change.values())
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_for_log("CN=alice"), "CN=alice");
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 100);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
        assert!(result.contains(&format!("{} bytes]", TRUNCATE_LIMIT + 100)));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_chars_safe() {
        let s = "é".repeat(200);
        assert!(truncate_for_log(&s).contains("... [truncated, total"));
    }

    #[test]
    fn secret_values_masked() {
        let out = values_for_log("UNICODEPWD", &[b"\"x\"".to_vec()]);
        assert_eq!(out, "<1 value(s) masked>");
    }

    #[test]
    fn changes_never_leak_password() {
        let changes = vec![
            Modification::Replace("unicodePwd".to_string(), vec![b"hunter2".to_vec()]),
            Modification::add("servicePrincipalName", ["HTTP/web"]),
        ];
        let out = changes_for_log(&changes);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("replace unicodePwd=<1 value(s) masked>"));
        assert!(out.contains("add servicePrincipalName=[HTTP/web]"));
    }
}
