//! Format checks for permission strings that are about to be trusted as
//! configuration (role tables, policy files).

use serde::Serialize;

use crate::permission::check_format;

/// Outcome of validating a list of permission strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// `true` iff every entry is well-formed.
    pub valid: bool,
    /// One message per invalid entry, in input order.
    pub errors: Vec<String>,
}

/// `true` iff `permission` has exactly three non-empty `:`-separated segments.
pub fn is_valid_format(permission: &str) -> bool {
    check_format(permission).is_ok()
}

/// Validate every entry, collecting an error naming the 1-based position and
/// the offending string for each malformed one.
pub fn validate_all<S: AsRef<str>>(permissions: &[S]) -> ValidationReport {
    let errors: Vec<String> = permissions
        .iter()
        .enumerate()
        .filter(|(_, p)| !is_valid_format(p.as_ref()))
        .map(|(idx, p)| {
            format!(
                "invalid permission #{}: \"{}\" (expected \"resource:action:scope\")",
                idx + 1,
                p.as_ref()
            )
        })
        .collect();

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}
