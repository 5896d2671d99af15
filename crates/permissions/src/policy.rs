//! Role policy: the role -> baseline permission table as configuration.
//!
//! The built-in table can be overridden per role from a JSON document:
//!
//! ```json
//! { "support": ["users:view:assigned", "tickets:manage:*"] }
//! ```
//!
//! Roles missing from the document keep their built-in defaults. Every
//! permission is format-checked before the policy is accepted; one bad entry
//! rejects the whole document. Roles are checked in name order, so a document
//! with several problems always reports the same one.

use std::collections::BTreeMap;
use std::env::VarError;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;

use crate::config::ROLE_POLICY_ENV;
use crate::roles::default_permissions;
use crate::validate::validate_all;
use crate::{Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy document is not valid JSON: {0}")]
    Parse(String),

    #[error("policy names unknown role '{0}'")]
    UnknownRole(String),

    #[error("invalid permissions for role '{role}': {}", .errors.join("; "))]
    InvalidPermissions { role: Role, errors: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    roles: BTreeMap<Role, Vec<Permission>>,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RolePolicy {
    pub fn builtin() -> Self {
        Self {
            roles: Role::ALL
                .into_iter()
                .map(|role| (role, default_permissions(role)))
                .collect(),
        }
    }

    pub fn from_json_str(document: &str) -> Result<Self, PolicyError> {
        let overrides: BTreeMap<String, Vec<String>> =
            serde_json::from_str(document).map_err(|e| PolicyError::Parse(e.to_string()))?;

        let mut policy = Self::builtin();
        for (name, permissions) in overrides {
            let role: Role = name.parse().map_err(|_| PolicyError::UnknownRole(name.clone()))?;

            let report = validate_all(&permissions);
            if !report.valid {
                return Err(PolicyError::InvalidPermissions {
                    role,
                    errors: report.errors,
                });
            }

            tracing::debug!(%role, count = permissions.len(), "role policy override");
            policy
                .roles
                .insert(role, permissions.into_iter().map(Permission::from).collect());
        }
        Ok(policy)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read role policy at {:?}", path))?;
        let policy = Self::from_json_str(&document)
            .with_context(|| format!("failed to load role policy at {:?}", path))?;
        tracing::info!(path = %path.display(), "role policy loaded");
        Ok(policy)
    }

    /// Load from the file named by `JIVAPAY_ROLE_POLICY`, or the built-in
    /// table when the variable is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(ROLE_POLICY_ENV) {
            Ok(path) => Self::from_path(path),
            Err(VarError::NotPresent) => Ok(Self::builtin()),
            Err(e) => Err(e).with_context(|| format!("failed to read {ROLE_POLICY_ENV}")),
        }
    }

    /// Baseline permissions for `role`, as a fresh copy.
    pub fn defaults_for(&self, role: Role) -> Vec<Permission> {
        self.roles.get(&role).cloned().unwrap_or_default()
    }

    /// Roles whose baseline set would satisfy `required`.
    pub fn roles_granting(&self, required: &str) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|(_, perms)| crate::matcher::matches(required, perms.as_slice()))
            .map(|(role, _)| *role)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry (audit view)
// ─────────────────────────────────────────────────────────────────────────────

/// Role definition with its baseline permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub role: Role,
    pub display_name: &'static str,
    pub description: &'static str,
    pub permissions: Vec<String>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: String,
    pub category: String,
    pub description: String,
}

/// Every role and every distinct permission a policy mentions.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: BTreeMap<Role, RoleDefinition>,
    pub permissions: BTreeMap<String, PermissionDefinition>,
}

impl RbacRegistry {
    pub fn from_policy(policy: &RolePolicy) -> Self {
        let mut roles = BTreeMap::new();
        let mut permissions = BTreeMap::new();

        for (role, perms) in &policy.roles {
            roles.insert(
                *role,
                RoleDefinition {
                    role: *role,
                    display_name: role.display_name(),
                    description: role.description(),
                    permissions: perms.iter().map(|p| p.to_string()).collect(),
                },
            );

            for perm in perms {
                permissions
                    .entry(perm.to_string())
                    .or_insert_with(|| describe_permission(perm));
            }
        }

        Self { roles, permissions }
    }
}

fn describe_permission(perm: &Permission) -> PermissionDefinition {
    if perm.is_global_wildcard() {
        return PermissionDefinition {
            name: perm.to_string(),
            category: "system".to_string(),
            description: "Wildcard permission - grants all permissions".to_string(),
        };
    }

    let p = perm.pattern();
    let action = match p.action {
        "*" => "Any action on",
        "view" => "View",
        "edit" => "Edit",
        "create" => "Create",
        "manage" => "Manage",
        "process" => "Process",
        other => other,
    };
    let scope = match p.scope {
        "*" => "any scope".to_string(),
        "own" => "own".to_string(),
        "team" => "team".to_string(),
        "assigned" => "assigned".to_string(),
        other => format!("'{other}'"),
    };

    PermissionDefinition {
        name: perm.to_string(),
        category: p.resource.to_string(),
        description: format!("{action} {} ({scope})", p.resource),
    }
}
