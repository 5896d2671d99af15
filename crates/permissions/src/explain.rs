use serde::Serialize;

use jivapay_core::UserId;

use crate::matcher::{MatchKind, find_match};
use crate::policy::RolePolicy;
use crate::{PermissionSession, Role, SessionState};

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a permission decision.
///
/// Answers "why was this allowed/denied?" for audit logs and support tooling.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// The permission that was being checked.
    pub required_permission: String,

    /// Whether access was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Rule and granted entry that satisfied the check.
    pub matched: Option<MatchedRule>,

    /// Snapshot of the profile, if the session is ready.
    pub profile: Option<ProfileState>,

    /// If denied, this explains what was missing.
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedRule {
    pub kind: MatchKind,
    pub granted_permission: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileState {
    pub user_id: UserId,
    pub role: Role,
    pub granted_permissions: Vec<String>,
    pub has_wildcard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    SessionNotReady,
    MalformedPermission,
    MissingPermission,
}

/// Explain how `session` answers `has_permission(required)`.
///
/// `policy` is only consulted to suggest roles that would grant a missing
/// permission.
pub fn explain(
    session: &PermissionSession,
    required: &str,
    policy: &RolePolicy,
) -> AuthorizationExplanation {
    let profile = match session.state() {
        SessionState::Ready(profile) => &**profile,
        SessionState::Uninitialized => return not_ready(required, "no profile is loaded"),
        SessionState::Loading => return not_ready(required, "the profile is still loading"),
        SessionState::Failed(msg) => {
            return not_ready(required, &format!("the profile failed to load: {msg}"));
        }
    };

    let state = ProfileState {
        user_id: profile.user_id,
        role: profile.role,
        granted_permissions: profile
            .granted_permissions
            .iter()
            .map(|p| p.to_string())
            .collect(),
        has_wildcard: profile.has_global_wildcard(),
    };

    if let Some(m) = find_match(required, &profile.granted_permissions) {
        let reason = match m.kind {
            MatchKind::GlobalWildcard => {
                format!("Profile holds the global wildcard '{}'", m.granted)
            }
            MatchKind::Exact => format!("Profile holds '{}' exactly", m.granted),
            MatchKind::ResourceWildcard => {
                format!("'{}' grants every resource", m.granted)
            }
            MatchKind::ActionWildcard => {
                format!("'{}' grants every action on the resource", m.granted)
            }
            MatchKind::ScopeWildcard => {
                format!("'{}' grants the action in every scope", m.granted)
            }
        };

        return AuthorizationExplanation {
            required_permission: required.to_string(),
            granted: true,
            reason,
            matched: Some(MatchedRule {
                kind: m.kind,
                granted_permission: m.granted.to_string(),
            }),
            profile: Some(state),
            denial_reason: None,
        };
    }

    if !crate::validate::is_valid_format(required) {
        return AuthorizationExplanation {
            required_permission: required.to_string(),
            granted: false,
            reason: format!("'{required}' is not a resource:action:scope permission"),
            matched: None,
            profile: Some(state),
            denial_reason: Some(DenialReason {
                kind: DenialKind::MalformedPermission,
                message: "Malformed permissions never match".to_string(),
                suggestions: vec![format!(
                    "Fix the permission string '{required}' at the call site"
                )],
            }),
        };
    }

    let granting_roles = policy.roles_granting(required);
    let mut suggestions = vec![format!("Grant '{required}' to the user directly")];
    if !granting_roles.is_empty() {
        let names: Vec<&str> = granting_roles.iter().map(|r| r.as_str()).collect();
        suggestions.insert(
            0,
            format!("Default permissions of these roles include it: {}", names.join(", ")),
        );
    }

    AuthorizationExplanation {
        required_permission: required.to_string(),
        granted: false,
        reason: format!(
            "Profile does not hold '{}'. Current permissions: {:?}",
            required, state.granted_permissions
        ),
        matched: None,
        profile: Some(state),
        denial_reason: Some(DenialReason {
            kind: DenialKind::MissingPermission,
            message: format!("Missing required permission: '{required}'"),
            suggestions,
        }),
    }
}

fn not_ready(required: &str, state: &str) -> AuthorizationExplanation {
    AuthorizationExplanation {
        required_permission: required.to_string(),
        granted: false,
        reason: format!("Denied because {state}"),
        matched: None,
        profile: None,
        denial_reason: Some(DenialReason {
            kind: DenialKind::SessionNotReady,
            message: "Permission checks fail closed until the session is ready".to_string(),
            suggestions: vec!["Wait for the session to load or sign in again".to_string()],
        }),
    }
}
