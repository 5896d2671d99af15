//! Declarative access gate evaluated against a [`PermissionSession`].
//!
//! Selector priority: roles, then a single permission, then a permission
//! list (ANY by default, ALL with [`PermissionGuard::all_of`]). A guard with
//! no selector allows. While the session is `Loading` or `Failed` the guard
//! always yields its fallback, whatever the selectors and `invert` say.

use crate::{PermissionSession, Role};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGuard {
    roles: Vec<Role>,
    permission: Option<String>,
    permissions: Vec<String>,
    require_all: bool,
    invert: bool,
}

impl PermissionGuard {
    /// Guard with no selector (allows once the session is settled).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Self {
            permission: Some(permission.into()),
            ..Self::default()
        }
    }

    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn all_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            require_all: true,
            ..Self::any_of(permissions)
        }
    }

    pub fn admin_only() -> Self {
        Self::roles([Role::Admin])
    }

    pub fn admin_roles_only() -> Self {
        Self::roles(Role::ADMIN_ROLES)
    }

    pub fn client_roles_only() -> Self {
        Self::roles(Role::CLIENT_ROLES)
    }

    /// Flip the outcome: pass when the check does *not* hold.
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// `true` iff the protected content should be shown.
    pub fn evaluate(&self, session: &PermissionSession) -> bool {
        if session.is_indeterminate() {
            return false;
        }

        let has_access = if !self.roles.is_empty() {
            session.has_role(&self.roles)
        } else if let Some(permission) = self.permission.as_deref().filter(|p| !p.is_empty()) {
            session.has_permission(permission)
        } else if !self.permissions.is_empty() {
            if self.require_all {
                session.has_all(&self.permissions)
            } else {
                session.has_any(&self.permissions)
            }
        } else {
            true
        };

        has_access != self.invert
    }

    /// Produce `children` when the guard passes, `fallback` otherwise.
    pub fn select<T>(
        &self,
        session: &PermissionSession,
        children: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> T {
        if self.evaluate(session) {
            children()
        } else {
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityError;
    use crate::{Permission, UserPermissions};
    use jivapay_core::UserId;

    fn session_for(role: Role, granted: &[&'static str]) -> PermissionSession {
        PermissionSession::ready(UserPermissions::new(
            UserId::new(1),
            role,
            granted.iter().map(|p| Permission::new(*p)).collect(),
        ))
    }

    #[test]
    fn roles_take_priority_over_permissions() {
        let session = session_for(Role::Merchant, &["orders:view:own"]);
        let guard = PermissionGuard {
            permission: Some("orders:view:own".to_string()),
            ..PermissionGuard::admin_only()
        };
        assert!(!guard.evaluate(&session));
    }

    #[test]
    fn single_permission_takes_priority_over_list() {
        let session = session_for(Role::Trader, &["balance:view:own"]);
        let guard = PermissionGuard {
            permissions: vec!["balance:view:own".to_string()],
            ..PermissionGuard::permission("orders:view:own")
        };
        assert!(!guard.evaluate(&session));
    }

    #[test]
    fn any_and_all_semantics() {
        let session = session_for(Role::Trader, &["balance:view:own"]);
        assert!(PermissionGuard::any_of(["balance:view:own", "x:y:z"]).evaluate(&session));
        assert!(!PermissionGuard::all_of(["balance:view:own", "x:y:z"]).evaluate(&session));
        assert!(PermissionGuard::all_of(["balance:view:own"]).evaluate(&session));
    }

    #[test]
    fn no_selector_allows_once_settled() {
        let session = session_for(Role::Trader, &[]);
        assert!(PermissionGuard::new().evaluate(&session));
        assert!(PermissionGuard::permission("").evaluate(&session));
        assert!(PermissionGuard::any_of(Vec::<String>::new()).evaluate(&session));
        assert!(PermissionGuard::roles(Vec::<Role>::new()).evaluate(&session));
    }

    #[test]
    fn invert_flips_the_outcome() {
        let session = session_for(Role::Support, &[]);
        assert!(PermissionGuard::admin_only().inverted().evaluate(&session));
        assert!(!PermissionGuard::admin_roles_only().inverted().evaluate(&session));
        assert_eq!(
            PermissionGuard::admin_only().inverted().inverted(),
            PermissionGuard::admin_only()
        );
    }

    #[test]
    fn loading_and_failed_always_fall_back() {
        let mut session = PermissionSession::new();
        let ticket = session.begin_loading();

        for guard in [
            PermissionGuard::new(),
            PermissionGuard::new().inverted(),
            PermissionGuard::admin_only().inverted(),
        ] {
            assert!(!guard.evaluate(&session));
            assert_eq!(guard.select(&session, || "children", || "fallback"), "fallback");
        }

        session.complete(ticket, Err(IdentityError::Unavailable("down".to_string())));
        assert!(!PermissionGuard::new().evaluate(&session));
        assert!(!PermissionGuard::permission("x:y:z").inverted().evaluate(&session));
    }

    #[test]
    fn uninitialized_session_denies_checks_but_not_inverted_ones() {
        let session = PermissionSession::new();
        assert!(!PermissionGuard::permission("orders:view:own").evaluate(&session));
        assert!(PermissionGuard::permission("orders:view:own").inverted().evaluate(&session));
    }

    #[test]
    fn presets() {
        let admin = session_for(Role::Admin, &["*:*:*"]);
        let lead = session_for(Role::TeamLead, &[]);
        let trader = session_for(Role::Trader, &[]);

        assert!(PermissionGuard::admin_only().evaluate(&admin));
        assert!(!PermissionGuard::admin_only().evaluate(&lead));
        assert!(PermissionGuard::admin_roles_only().evaluate(&lead));
        assert!(!PermissionGuard::admin_roles_only().evaluate(&trader));
        assert!(PermissionGuard::client_roles_only().evaluate(&trader));
        assert!(!PermissionGuard::client_roles_only().evaluate(&admin));
    }

    #[test]
    fn select_runs_only_the_chosen_branch() {
        let session = session_for(Role::Merchant, &["stores:manage:own"]);
        let guard = PermissionGuard::permission("stores:manage:own");
        let out = guard.select(
            &session,
            || "store settings".to_string(),
            || panic!("fallback must not be built"),
        );
        assert_eq!(out, "store settings");
    }
}
