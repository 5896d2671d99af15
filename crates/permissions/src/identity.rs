//! Identity-provider contract.
//!
//! The provider is the authoritative source of a session's profile. Records
//! are mapped 1:1 into [`UserPermissions`]; the only check applied here is
//! that the role belongs to the closed role set.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jivapay_core::UserId;

use crate::{Permission, Role, UserPermissions};

/// Profile record as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: i64,
    pub role: String,
    #[serde(default)]
    pub granted_permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why a profile could not be obtained.
///
/// The `Display` output is what a failed session exposes as its error
/// message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider returned unknown role '{0}'")]
    UnknownRole(String),

    #[error("malformed identity record: {0}")]
    Malformed(String),

    #[error("identity provider timed out after {0:?}")]
    TimedOut(Duration),
}

impl IdentityRecord {
    pub fn new(id: i64, role: impl Into<String>, granted_permissions: Vec<String>) -> Self {
        Self {
            id,
            role: role.into(),
            granted_permissions,
            expires_at: None,
        }
    }

    /// Decode a record from the provider's JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, IdentityError> {
        serde_json::from_str(payload).map_err(|e| IdentityError::Malformed(e.to_string()))
    }

    pub fn into_profile(self) -> Result<UserPermissions, IdentityError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| IdentityError::UnknownRole(self.role.clone()))?;

        Ok(UserPermissions {
            user_id: UserId::new(self.id),
            role,
            granted_permissions: self
                .granted_permissions
                .into_iter()
                .map(Permission::from)
                .collect(),
            expires_at: self.expires_at,
        })
    }
}

/// Source of the active user's profile.
pub trait IdentityProvider {
    fn fetch_profile(&self) -> impl Future<Output = Result<IdentityRecord, IdentityError>> + Send;
}

/// Provider answering from a fixed outcome, optionally after a delay.
///
/// Stands in for the real HTTP endpoint in portals and tests.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    outcome: Result<IdentityRecord, IdentityError>,
    delay: Option<Duration>,
}

impl StaticIdentityProvider {
    pub fn returning(record: IdentityRecord) -> Self {
        Self {
            outcome: Ok(record),
            delay: None,
        }
    }

    pub fn failing(error: IdentityError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn fetch_profile(&self) -> impl Future<Output = Result<IdentityRecord, IdentityError>> + Send {
        let outcome = self.outcome.clone();
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        }
    }
}
