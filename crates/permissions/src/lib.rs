//! `jivapay-permissions` — role-based permission evaluation for the JivaPay
//! portals.
//!
//! Permissions are `resource:action:scope` strings (`orders:edit:team`). A
//! granted `*` segment matches anything in its position and `*:*:*` grants
//! everything. This crate is intentionally decoupled from rendering and
//! transport: portals hold a [`PermissionSession`], feed it the profile from
//! an [`IdentityProvider`], and gate UI with [`PermissionGuard`].

pub mod config;
pub mod explain;
pub mod guard;
pub mod identity;
pub mod matcher;
pub mod permission;
pub mod policy;
pub mod profile;
pub mod roles;
pub mod session;
pub mod validate;

pub use config::SessionConfig;
pub use explain::{AuthorizationExplanation, DenialKind, explain};
pub use guard::PermissionGuard;
pub use identity::{IdentityError, IdentityProvider, IdentityRecord, StaticIdentityProvider};
pub use matcher::{Match, MatchKind, find_match, matches, matches_template, resolve_template};
pub use permission::{
    GLOBAL_WILDCARD, Permission, PermissionFormatError, PermissionPattern, WILDCARD,
    parse_permission,
};
pub use policy::{PolicyError, RbacRegistry, RolePolicy};
pub use profile::{
    UserPermissions, check_all_user_permissions, check_any_user_permission,
    check_user_permission, check_user_role, is_user_admin, is_user_admin_role,
    is_user_client_role,
};
pub use roles::{Role, default_permissions, defaults_for};
pub use session::{LoadTicket, PermissionSession, SessionState};
pub use validate::{ValidationReport, is_valid_format, validate_all};
