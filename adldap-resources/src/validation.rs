//! Input checks shared by the handlers

use std::sync::LazyLock;

use adldap_directory::DistinguishedName;
use regex::Regex;

use crate::error::{ResourceError, ResourceResult};

/// `service/host[:port]`, host made of DNS labels.
static SPN_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_]+/(([a-zA-Z]|[a-zA-Z][a-zA-Z0-9\-]*[a-zA-Z0-9])\.)*([A-Za-z]|[A-Za-z][A-Za-z0-9\-]*[A-Za-z0-9])(:\d{1,5})?$",
    )
});

pub fn is_valid_spn(spn: &str) -> bool {
    SPN_PATTERN
        .as_ref()
        .is_ok_and(|pattern| pattern.is_match(spn))
}

pub fn validate_spn(spn: &str) -> ResourceResult<()> {
    if is_valid_spn(spn) {
        Ok(())
    } else {
        Err(ResourceError::Validation(format!(
            "SPN \"{spn}\" must be of format \"service/host(:port)\""
        )))
    }
}

pub fn validate_spns(spns: &[String]) -> ResourceResult<()> {
    spns.iter().try_for_each(|spn| validate_spn(spn))
}

pub fn require(field: &str, value: &str) -> ResourceResult<()> {
    if value.trim().is_empty() {
        return Err(ResourceError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Parse a declared DN, naming the field on failure.
pub fn parse_dn(field: &str, value: &str) -> ResourceResult<DistinguishedName> {
    require(field, value)?;
    DistinguishedName::parse(value)
        .map_err(|e| ResourceError::Validation(format!("{field}: {e}")))
}
