//! Environment-driven configuration.
//!
//! | variable | meaning |
//! |---|---|
//! | `JIVAPAY_ROLE_POLICY` | path to a JSON role-policy file (see [`crate::policy`]) |
//! | `JIVAPAY_IDENTITY_TIMEOUT_MS` | profile fetch timeout in milliseconds; unset or `0` disables it |

use std::env::VarError;
use std::time::Duration;

use anyhow::Context;

pub const ROLE_POLICY_ENV: &str = "JIVAPAY_ROLE_POLICY";
pub const IDENTITY_TIMEOUT_ENV: &str = "JIVAPAY_IDENTITY_TIMEOUT_MS";

/// Session behaviour knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Upper bound on the profile fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(IDENTITY_TIMEOUT_ENV) {
            Ok(raw) => Self::from_timeout_ms(&raw),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {IDENTITY_TIMEOUT_ENV}")),
        }
    }

    fn from_timeout_ms(raw: &str) -> anyhow::Result<Self> {
        let ms: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{IDENTITY_TIMEOUT_ENV} must be milliseconds, got {raw:?}"))?;

        Ok(Self {
            fetch_timeout: (ms > 0).then(|| Duration::from_millis(ms)),
        })
    }
}
