//! Wildcard matching of a required permission against a granted set.
//!
//! Granted entries are tried in order and the first one that satisfies the
//! requirement wins. Precedence per entry:
//!
//! 1. exact string equality
//! 2. `*` resource (grants everything)
//! 3. same resource, `*` action (any action, any scope)
//! 4. same resource and action, `*` scope
//!
//! A `*:*:*` entry anywhere in the set short-circuits before the scan.
//! Wildcards are only honoured on the granted side; a `*` inside the
//! required string is compared as a literal segment.

use serde::Serialize;

use crate::permission::{GLOBAL_WILDCARD, WILDCARD, parse_permission};

/// Placeholder substituted with an entity id in permission templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Which rule satisfied the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    GlobalWildcard,
    Exact,
    ResourceWildcard,
    ActionWildcard,
    ScopeWildcard,
}

/// A successful match: the rule that fired and the granted entry behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'g> {
    pub kind: MatchKind,
    pub granted: &'g str,
}

/// `true` iff `granted` satisfies `required`.
///
/// Never fails: a malformed `required` string is denied unless the set holds
/// `*:*:*`, and malformed granted entries are skipped.
pub fn matches<S: AsRef<str>>(required: &str, granted: &[S]) -> bool {
    find_match(required, granted).is_some()
}

/// Like [`matches`], but reports which granted entry satisfied the
/// requirement and through which rule.
pub fn find_match<'g, S: AsRef<str>>(required: &str, granted: &'g [S]) -> Option<Match<'g>> {
    if let Some(g) = granted.iter().map(as_str).find(|g| *g == GLOBAL_WILDCARD) {
        tracing::debug!(required, "matched global wildcard");
        return Some(Match {
            kind: MatchKind::GlobalWildcard,
            granted: g,
        });
    }

    let req = parse_permission(required);
    if !req.is_well_formed() {
        tracing::debug!(required, "malformed required permission; denying");
        return None;
    }

    for entry in granted {
        let entry = entry.as_ref();

        let kind = if entry == required {
            MatchKind::Exact
        } else {
            let g = parse_permission(entry);
            if !g.is_well_formed() {
                tracing::debug!(granted = entry, "skipping malformed granted permission");
                continue;
            }

            if g.resource == WILDCARD {
                MatchKind::ResourceWildcard
            } else if g.resource == req.resource && g.action == WILDCARD {
                MatchKind::ActionWildcard
            } else if g.resource == req.resource && g.action == req.action && g.scope == WILDCARD {
                MatchKind::ScopeWildcard
            } else {
                continue;
            }
        };

        tracing::debug!(required, granted = entry, ?kind, "permission matched");
        return Some(Match {
            kind,
            granted: entry,
        });
    }

    tracing::debug!(required, "no granted permission matched");
    None
}

fn as_str<S: AsRef<str>>(s: &S) -> &str {
    s.as_ref()
}

/// Substitute `{id}` in a permission template.
///
/// Templates without the placeholder are returned unchanged. A template that
/// needs an id but gets none resolves to `None`, which callers treat as
/// "no access".
pub fn resolve_template<T: core::fmt::Display>(template: &str, id: Option<T>) -> Option<String> {
    if !template.contains(ID_PLACEHOLDER) {
        return Some(template.to_string());
    }

    match id {
        Some(id) => Some(template.replace(ID_PLACEHOLDER, &id.to_string())),
        None => {
            tracing::warn!(template, "permission template requires an entity id, none given");
            None
        }
    }
}

/// Resolve a `{id}` template and match the result.
pub fn matches_template<T, S>(template: &str, id: Option<T>, granted: &[S]) -> bool
where
    T: core::fmt::Display,
    S: AsRef<str>,
{
    resolve_template(template, id).is_some_and(|required| matches(&required, granted))
}
