//! The active user's permission profile and context-free checks over it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jivapay_core::UserId;

use crate::{Permission, Role, matcher};

/// Permission profile of one authenticated user.
///
/// Produced once per session by the identity provider and never mutated;
/// re-login yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    pub user_id: UserId,
    pub role: Role,
    pub granted_permissions: Vec<Permission>,
    /// When the session backing this profile stops being valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserPermissions {
    pub fn new(user_id: UserId, role: Role, granted_permissions: Vec<Permission>) -> Self {
        Self {
            user_id,
            role,
            granted_permissions,
            expires_at: None,
        }
    }

    /// Profile seeded with the role's baseline permissions.
    pub fn with_role_defaults(user_id: UserId, role: Role) -> Self {
        Self::new(user_id, role, crate::roles::default_permissions(role))
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        matcher::matches(permission, &self.granted_permissions)
    }

    pub fn has_any<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        permissions.iter().any(|p| self.has_permission(p.as_ref()))
    }

    /// Vacuously `true` for an empty list.
    pub fn has_all<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        permissions.iter().all(|p| self.has_permission(p.as_ref()))
    }

    pub fn has_global_wildcard(&self) -> bool {
        self.granted_permissions.iter().any(Permission::is_global_wildcard)
    }
}

pub fn check_user_permission(profile: Option<&UserPermissions>, permission: &str) -> bool {
    profile.is_some_and(|p| p.has_permission(permission))
}

pub fn check_any_user_permission<S: AsRef<str>>(
    profile: Option<&UserPermissions>,
    permissions: &[S],
) -> bool {
    profile.is_some_and(|p| p.has_any(permissions))
}

pub fn check_all_user_permissions<S: AsRef<str>>(
    profile: Option<&UserPermissions>,
    permissions: &[S],
) -> bool {
    profile.is_some_and(|p| p.has_all(permissions))
}

pub fn check_user_role(profile: Option<&UserPermissions>, roles: &[Role]) -> bool {
    profile.is_some_and(|p| roles.contains(&p.role))
}

pub fn is_user_admin(profile: Option<&UserPermissions>) -> bool {
    profile.is_some_and(|p| p.role == Role::Admin)
}

pub fn is_user_admin_role(profile: Option<&UserPermissions>) -> bool {
    profile.is_some_and(|p| p.role.is_admin_role())
}

pub fn is_user_client_role(profile: Option<&UserPermissions>) -> bool {
    profile.is_some_and(|p| p.role.is_client_role())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn teamlead() -> UserPermissions {
        UserPermissions::new(
            UserId::new(17),
            Role::TeamLead,
            vec![
                Permission::new("orders:view:team"),
                Permission::new("trader:manage:team"),
            ],
        )
    }

    #[test]
    fn checks_without_profile_fail_closed() {
        assert!(!check_user_permission(None, "orders:view:team"));
        assert!(!check_any_user_permission(None, &["orders:view:team"]));
        assert!(!check_all_user_permissions::<&str>(None, &[]));
        assert!(!check_user_role(None, &Role::ALL));
        assert!(!is_user_admin(None));
        assert!(!is_user_admin_role(None));
        assert!(!is_user_client_role(None));
    }

    #[test]
    fn checks_with_profile() {
        let p = teamlead();
        assert!(check_user_permission(Some(&p), "orders:view:team"));
        assert!(!check_user_permission(Some(&p), "orders:view:own"));
        assert!(check_any_user_permission(Some(&p), &["x:y:z", "trader:manage:team"]));
        assert!(!check_all_user_permissions(Some(&p), &["x:y:z", "trader:manage:team"]));
        assert!(check_all_user_permissions::<&str>(Some(&p), &[]));
        assert!(check_user_role(Some(&p), &[Role::TeamLead, Role::Admin]));
        assert!(!check_user_role(Some(&p), &[Role::Trader]));
        assert!(!is_user_admin(Some(&p)));
        assert!(is_user_admin_role(Some(&p)));
        assert!(!is_user_client_role(Some(&p)));
    }

    #[test]
    fn role_defaults_seed_a_profile() {
        let admin = UserPermissions::with_role_defaults(UserId::new(1), Role::Admin);
        assert!(admin.has_global_wildcard());
        assert!(admin.has_permission("finance:view:platform"));

        let merchant = UserPermissions::with_role_defaults(UserId::new(2), Role::Merchant);
        assert!(merchant.has_permission("api-keys:manage:own"));
        assert!(!merchant.has_permission("orders:process:assigned"));
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Utc::now();
        let p = teamlead().expiring_at(now);
        assert!(p.is_expired(now));
        assert!(!p.is_expired(now - Duration::seconds(1)));
        assert!(!teamlead().is_expired(now));
    }
}
