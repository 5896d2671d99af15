//! Session-scoped permission queries.
//!
//! A [`PermissionSession`] holds at most one active profile and walks the
//! lifecycle `Uninitialized -> Loading -> Ready | Failed`. Every query is
//! fail-closed: outside `Ready` it answers `false`.
//!
//! Each `begin_loading`, `replace` or `logout` starts a new epoch. A
//! [`LoadTicket`] from an older epoch is stale and its result is dropped, so
//! a fetch that outlives the consumer that started it cannot overwrite newer
//! state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use jivapay_core::UserId;

use crate::config::SessionConfig;
use crate::identity::{IdentityError, IdentityProvider, IdentityRecord};
use crate::profile::{self, UserPermissions};
use crate::validate::validate_all;
use crate::{Permission, Role, matcher};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Ready(Arc<UserPermissions>),
    /// Display-ready message of the failed fetch.
    Failed(String),
}

/// Proof that a load was started in a given epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a load ticket is needed to complete the load"]
pub struct LoadTicket {
    epoch: u64,
}

#[derive(Debug, Default)]
pub struct PermissionSession {
    state: SessionState,
    epoch: u64,
    config: SessionConfig,
}

impl PermissionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Session that is already `Ready` with `profile`.
    pub fn ready(profile: UserPermissions) -> Self {
        let mut session = Self::new();
        session.replace(profile);
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    /// `Loading` or `Failed`: the outcome of a check cannot be trusted yet.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self.state, SessionState::Loading | SessionState::Failed(_))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    pub fn begin_loading(&mut self) -> LoadTicket {
        self.epoch += 1;
        self.state = SessionState::Loading;
        tracing::info!(epoch = self.epoch, "permission session loading");
        LoadTicket { epoch: self.epoch }
    }

    /// Apply a fetch result. Returns `false` (and changes nothing) when the
    /// ticket is stale.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<IdentityRecord, IdentityError>,
    ) -> bool {
        if ticket.epoch != self.epoch || !self.is_loading() {
            tracing::warn!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                "discarding stale profile fetch result"
            );
            return false;
        }

        self.state = match result.and_then(IdentityRecord::into_profile) {
            Ok(profile) => {
                let report = validate_all(&profile.granted_permissions);
                if !report.valid {
                    tracing::warn!(
                        user_id = %profile.user_id,
                        errors = ?report.errors,
                        "profile carries malformed permissions; they will never match"
                    );
                }
                tracing::info!(
                    user_id = %profile.user_id,
                    role = %profile.role,
                    "permission session ready"
                );
                SessionState::Ready(Arc::new(profile))
            }
            Err(err) => {
                tracing::warn!(error = %err, "permission session failed");
                SessionState::Failed(err.to_string())
            }
        };
        true
    }

    /// Fetch the profile from `provider` and settle the session.
    ///
    /// Honours [`SessionConfig::fetch_timeout`]. No retry on failure.
    pub async fn load<P: IdentityProvider>(&mut self, provider: &P) -> &SessionState {
        let ticket = self.begin_loading();

        let result = match self.config.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, provider.fetch_profile()).await {
                Ok(result) => result,
                Err(_) => Err(IdentityError::TimedOut(limit)),
            },
            None => provider.fetch_profile().await,
        };

        self.complete(ticket, result);
        &self.state
    }

    /// Install a new profile directly (re-login, role change).
    pub fn replace(&mut self, profile: UserPermissions) {
        self.epoch += 1;
        tracing::info!(
            user_id = %profile.user_id,
            role = %profile.role,
            "permission profile replaced"
        );
        self.state = SessionState::Ready(Arc::new(profile));
    }

    pub fn logout(&mut self) {
        self.epoch += 1;
        self.state = SessionState::Uninitialized;
        tracing::info!("permission session cleared");
    }

    /// Clear a `Ready` session whose profile has expired. Returns whether it
    /// was cleared.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self.profile().is_some_and(|p| p.is_expired(now));
        if expired {
            tracing::info!("permission profile expired");
            self.epoch += 1;
            self.state = SessionState::Uninitialized;
        }
        expired
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn profile(&self) -> Option<&UserPermissions> {
        match &self.state {
            SessionState::Ready(profile) => Some(profile.as_ref()),
            _ => None,
        }
    }

    /// Shared handle on the current profile, for consumers that outlive a
    /// borrow of the session.
    pub fn snapshot(&self) -> Option<Arc<UserPermissions>> {
        match &self.state {
            SessionState::Ready(profile) => Some(Arc::clone(profile)),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.profile().map(|p| p.role)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.profile().map(|p| p.user_id)
    }

    pub fn granted_permissions(&self) -> &[Permission] {
        self.profile()
            .map(|p| p.granted_permissions.as_slice())
            .unwrap_or_default()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        profile::check_user_permission(self.profile(), permission)
    }

    pub fn has_any<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        profile::check_any_user_permission(self.profile(), permissions)
    }

    /// `true` for an empty list once `Ready` (vacuous truth).
    pub fn has_all<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        profile::check_all_user_permissions(self.profile(), permissions)
    }

    /// Check a `{id}` template such as `orders:edit:{id}` for one entity.
    pub fn has_permission_for<T: core::fmt::Display>(&self, template: &str, id: T) -> bool {
        self.profile().is_some_and(|p| {
            matcher::matches_template(template, Some(id), &p.granted_permissions)
        })
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        profile::check_user_role(self.profile(), roles)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_support(&self) -> bool {
        self.role() == Some(Role::Support)
    }

    pub fn is_team_lead(&self) -> bool {
        self.role() == Some(Role::TeamLead)
    }

    pub fn is_merchant(&self) -> bool {
        self.role() == Some(Role::Merchant)
    }

    pub fn is_trader(&self) -> bool {
        self.role() == Some(Role::Trader)
    }

    pub fn is_admin_role(&self) -> bool {
        profile::is_user_admin_role(self.profile())
    }

    pub fn is_client_role(&self) -> bool {
        profile::is_user_client_role(self.profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teamlead_record() -> IdentityRecord {
        IdentityRecord::new(
            11,
            "teamlead",
            vec!["orders:view:team".to_string(), "trader:manage:team".to_string()],
        )
    }

    fn assert_all_queries_false(session: &PermissionSession) {
        assert!(!session.has_permission("orders:view:team"));
        assert!(!session.has_any(&["orders:view:team"]));
        assert!(!session.has_all::<&str>(&[]));
        assert!(!session.has_permission_for("orders:view:{id}", 1));
        assert!(!session.has_role(&Role::ALL));
        assert!(!session.is_admin());
        assert!(!session.is_support());
        assert!(!session.is_team_lead());
        assert!(!session.is_merchant());
        assert!(!session.is_trader());
        assert!(!session.is_admin_role());
        assert!(!session.is_client_role());
        assert!(session.granted_permissions().is_empty());
        assert_eq!(session.role(), None);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn new_session_is_uninitialized_and_fails_closed() {
        let session = PermissionSession::new();
        assert_eq!(session.state(), &SessionState::Uninitialized);
        assert!(!session.is_indeterminate());
        assert_all_queries_false(&session);
    }

    #[test]
    fn loading_session_fails_closed() {
        let mut session = PermissionSession::new();
        let _ticket = session.begin_loading();
        assert!(session.is_loading());
        assert!(session.is_indeterminate());
        assert_all_queries_false(&session);
    }

    #[test]
    fn successful_completion_makes_session_ready() {
        let mut session = PermissionSession::new();
        let ticket = session.begin_loading();
        assert!(session.complete(ticket, Ok(teamlead_record())));

        assert!(session.has_permission("orders:view:team"));
        assert!(!session.has_permission("orders:view:own"));
        assert!(session.is_team_lead());
        assert!(session.is_admin_role());
        assert!(!session.is_client_role());
        assert_eq!(session.user_id(), Some(UserId::new(11)));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn has_all_of_nothing_is_true_once_ready() {
        let session = PermissionSession::ready(UserPermissions::new(
            UserId::new(1),
            Role::Trader,
            vec![],
        ));
        assert!(session.has_all::<&str>(&[]));
        assert!(!session.has_any::<&str>(&[]));
    }

    #[test]
    fn failed_fetch_exposes_message_and_fails_closed() {
        let mut session = PermissionSession::new();
        let ticket = session.begin_loading();
        session.complete(ticket, Err(IdentityError::Unavailable("503".to_string())));

        assert_eq!(session.error(), Some("identity provider unavailable: 503"));
        assert!(session.is_indeterminate());
        assert_all_queries_false(&session);
    }

    #[test]
    fn unknown_role_in_record_fails_the_session() {
        let mut session = PermissionSession::new();
        let ticket = session.begin_loading();
        session.complete(ticket, Ok(IdentityRecord::new(1, "root", vec![])));
        assert_eq!(
            session.error(),
            Some("identity provider returned unknown role 'root'")
        );
    }

    #[test]
    fn stale_ticket_after_logout_is_discarded() {
        let mut session = PermissionSession::new();
        let ticket = session.begin_loading();
        session.logout();

        assert!(!session.complete(ticket, Ok(teamlead_record())));
        assert_eq!(session.state(), &SessionState::Uninitialized);
    }

    #[test]
    fn superseded_load_is_discarded() {
        let mut session = PermissionSession::new();
        let first = session.begin_loading();
        let second = session.begin_loading();

        assert!(!session.complete(first, Ok(teamlead_record())));
        assert!(session.is_loading());
        assert!(session.complete(second, Err(IdentityError::Unavailable("down".into()))));
        assert!(session.error().is_some());
    }

    #[test]
    fn ticket_cannot_be_applied_twice() {
        let mut session = PermissionSession::new();
        let ticket = session.begin_loading();
        assert!(session.complete(ticket, Ok(teamlead_record())));
        assert!(!session.complete(ticket, Err(IdentityError::Unavailable("late".into()))));
        assert!(session.is_team_lead());
    }

    #[test]
    fn replace_swaps_the_whole_profile() {
        let mut session = PermissionSession::ready(UserPermissions::with_role_defaults(
            UserId::new(1),
            Role::Merchant,
        ));
        let before = session.snapshot().unwrap();
        assert!(session.is_merchant());

        session.replace(UserPermissions::with_role_defaults(UserId::new(2), Role::Admin));
        assert!(session.is_admin());
        assert!(session.has_permission("anything:at:all"));
        // Earlier snapshots are unaffected.
        assert_eq!(before.role, Role::Merchant);
    }

    #[test]
    fn expiry_clears_ready_session() {
        let now = Utc::now();
        let mut session = PermissionSession::ready(
            UserPermissions::with_role_defaults(UserId::new(3), Role::Support)
                .expiring_at(now + chrono::Duration::minutes(5)),
        );

        assert!(!session.expire_if_due(now));
        assert!(session.is_support());

        assert!(session.expire_if_due(now + chrono::Duration::minutes(5)));
        assert_eq!(session.state(), &SessionState::Uninitialized);
        assert!(!session.expire_if_due(now + chrono::Duration::minutes(10)));
    }

    #[test]
    fn entity_templates_are_resolved_per_id() {
        let session = PermissionSession::ready(UserPermissions::new(
            UserId::new(4),
            Role::Support,
            vec![Permission::new("orders:edit:123")],
        ));
        assert!(session.has_permission_for("orders:edit:{id}", 123));
        assert!(!session.has_permission_for("orders:edit:{id}", 456));
    }
}
