use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Segment value that matches anything in its position.
pub const WILDCARD: &str = "*";

/// Granted entry that satisfies every required permission.
pub const GLOBAL_WILDCARD: &str = "*:*:*";

/// Permission identifier in `resource:action:scope` form
/// (e.g. `"orders:view:own"`).
///
/// Construction through [`Permission::new`] never validates: values coming
/// from the identity provider are authoritative and are checked by the
/// matcher at evaluation time. Use [`Permission::parse`] (or `FromStr`) when
/// the string is about to be trusted as configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionFormatError {
    #[error("expected 3 segments in '{value}', found {found}")]
    SegmentCount { value: String, found: usize },

    #[error("segment {position} of '{value}' is empty")]
    EmptySegment { value: String, position: usize },
}

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Build a permission from a string, rejecting anything that is not
    /// three non-empty colon-separated segments.
    pub fn parse(name: impl Into<Cow<'static, str>>) -> Result<Self, PermissionFormatError> {
        let name = name.into();
        check_format(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global_wildcard(&self) -> bool {
        self.as_str() == GLOBAL_WILDCARD
    }

    pub fn pattern(&self) -> PermissionPattern<'_> {
        parse_permission(self.as_str())
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for Permission {
    type Err = PermissionFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.to_string())
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The `{resource, action, scope}` triple of a permission string.
///
/// Borrowed from the source string and recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPattern<'a> {
    pub resource: &'a str,
    pub action: &'a str,
    pub scope: &'a str,
    segment_count: usize,
}

impl<'a> PermissionPattern<'a> {
    /// Number of `:`-separated segments in the source string.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Exactly three segments, none of them empty.
    pub fn is_well_formed(&self) -> bool {
        self.segment_count == 3
            && !self.resource.is_empty()
            && !self.action.is_empty()
            && !self.scope.is_empty()
    }
}

/// Split a permission string into its three segments.
///
/// Purely mechanical: missing segments come back as `""` and anything after
/// the third segment is ignored. Use [`PermissionPattern::is_well_formed`] or
/// [`crate::validate::is_valid_format`] to check the shape.
pub fn parse_permission(permission: &str) -> PermissionPattern<'_> {
    let mut parts = permission.split(':');
    let resource = parts.next().unwrap_or_default();
    let action = parts.next().unwrap_or_default();
    let scope = parts.next().unwrap_or_default();
    let segment_count = permission.split(':').count();

    PermissionPattern {
        resource,
        action,
        scope,
        segment_count,
    }
}

pub(crate) fn check_format(value: &str) -> Result<(), PermissionFormatError> {
    let found = value.split(':').count();
    if found != 3 {
        return Err(PermissionFormatError::SegmentCount {
            value: value.to_string(),
            found,
        });
    }
    if let Some(idx) = value.split(':').position(str::is_empty) {
        return Err(PermissionFormatError::EmptySegment {
            value: value.to_string(),
            position: idx + 1,
        });
    }
    Ok(())
}
