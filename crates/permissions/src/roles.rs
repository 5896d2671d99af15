use serde::{Deserialize, Serialize};

use jivapay_core::{DomainError, DomainResult};

use crate::Permission;

/// Platform role.
///
/// Staff roles (`admin`, `support`, `teamlead`) operate the platform; client
/// roles (`merchant`, `trader`) use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Support,
    TeamLead,
    Merchant,
    Trader,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Support,
        Role::TeamLead,
        Role::Merchant,
        Role::Trader,
    ];

    pub const ADMIN_ROLES: [Role; 3] = [Role::Admin, Role::Support, Role::TeamLead];

    pub const CLIENT_ROLES: [Role; 2] = [Role::Merchant, Role::Trader];

    /// Wire name (`"admin"`, `"teamlead"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Support => "support",
            Role::TeamLead => "teamlead",
            Role::Merchant => "merchant",
            Role::Trader => "trader",
        }
    }

    /// Label shown in the portals.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Admin => "Администратор",
            Role::Support => "Поддержка",
            Role::TeamLead => "Тимлид",
            Role::Merchant => "Мерчант",
            Role::Trader => "Трейдер",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Admin => "Platform administrator with unrestricted access",
            Role::Support => "Support agent working assigned users, orders and tickets",
            Role::TeamLead => "Team lead managing a team of traders and their traffic",
            Role::Merchant => "Merchant operating stores, webhooks and API keys",
            Role::Trader => "Trader processing assigned orders against own requisites",
        }
    }

    pub fn is_admin_role(self) -> bool {
        match self {
            Role::Admin | Role::Support | Role::TeamLead => true,
            Role::Merchant | Role::Trader => false,
        }
    }

    pub fn is_client_role(self) -> bool {
        match self {
            Role::Merchant | Role::Trader => true,
            Role::Admin | Role::Support | Role::TeamLead => false,
        }
    }

    /// Baseline permission strings for this role.
    pub fn default_permission_strs(self) -> &'static [&'static str] {
        match self {
            Role::Admin => ADMIN_DEFAULTS,
            Role::Support => SUPPORT_DEFAULTS,
            Role::TeamLead => TEAMLEAD_DEFAULTS,
            Role::Merchant => MERCHANT_DEFAULTS,
            Role::Trader => TRADER_DEFAULTS,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::unknown_role(s))
    }
}

const ADMIN_DEFAULTS: &[&str] = &["*:*:*"];

const SUPPORT_DEFAULTS: &[&str] = &[
    "users:view:assigned",
    "orders:view:assigned",
    "orders:edit:assigned",
    "tickets:manage:own",
    "dashboard:view:basic",
];

const TEAMLEAD_DEFAULTS: &[&str] = &[
    "users:view:team",
    "orders:view:team",
    "trader:manage:team",
    // toggles trader traffic for the team
    "trader:traffic:team",
    "statistics:view:team",
    "dashboard:view:team",
];

const MERCHANT_DEFAULTS: &[&str] = &[
    "stores:manage:own",
    "orders:view:own",
    "orders:create:own",
    "reports:view:own",
    "webhooks:manage:own",
    "api-keys:manage:own",
    "dashboard:view:own",
];

const TRADER_DEFAULTS: &[&str] = &[
    "requisites:manage:own",
    "orders:view:assigned",
    // confirming an order on the trader side
    "orders:process:assigned",
    "balance:view:own",
    "balance:history:own",
    "profile:manage:own",
    "dashboard:view:own",
];

/// Baseline permissions for `role`, freshly allocated on every call.
///
/// Reference data only: the live set for a session is whatever the identity
/// provider returned.
pub fn default_permissions(role: Role) -> Vec<Permission> {
    role.default_permission_strs()
        .iter()
        .map(|p| Permission::new(*p))
        .collect()
}

/// Baseline permissions by role name. Unknown names yield an empty list.
pub fn defaults_for(role: &str) -> Vec<String> {
    match role.parse::<Role>() {
        Ok(role) => role
            .default_permission_strs()
            .iter()
            .map(|p| p.to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
