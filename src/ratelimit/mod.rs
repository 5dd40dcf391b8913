//! Per-client admission control.
//!
//! Every policy is a counter keyed by client IP that lives for a fixed window
//! from first touch. Every request bumps the counter without extending the
//! window; once it passes the ceiling the policy answers with its
//! `on_exceed` decision until the entry expires.

pub mod store;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::ratelimit::store::{StoreError, TtlStore};

/// Art fetches per client allowed inside one window.
pub const ART_CEILING: u32 = 16;
/// Art window, fixed from first touch.
pub const ART_WINDOW: Duration = Duration::from_secs(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Hard rejection (429).
    Reject,
    /// Throttled, but the client's cached copy is still good (304).
    UseCached,
}

#[derive(Debug, Clone)]
pub struct Policy {
    /// Key namespace in the backing store.
    pub name: &'static str,
    pub window: Duration,
    pub ceiling: u32,
    pub on_exceed: Decision,
}

impl Policy {
    /// One admission per window; everything after it is rejected.
    pub fn lockout(name: &'static str, window: Duration) -> Self {
        Self {
            name,
            window,
            ceiling: 1,
            on_exceed: Decision::Reject,
        }
    }

    /// Up to `ceiling` admissions per window, then "use your cache".
    pub fn graduated(name: &'static str, window: Duration, ceiling: u32) -> Self {
        Self {
            name,
            window,
            ceiling,
            on_exceed: Decision::UseCached,
        }
    }

    /// Song request submission.
    pub fn request(window: Duration) -> Self {
        Self::lockout("request", window)
    }

    /// Album art fetches.
    pub fn art() -> Self {
        Self::graduated("art", ART_WINDOW, ART_CEILING)
    }

    fn key(&self, ip: IpAddr) -> String {
        format!("{}:{}", self.name, ip)
    }
}

/// Admission gate over an injected [`TtlStore`].
///
/// Store failures are returned to the caller, never turned into an admit.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self { store }
    }

    pub async fn admit(&self, ip: IpAddr, policy: &Policy) -> Result<Decision, StoreError> {
        let key = policy.key(ip);

        // Check and update are a single store operation.
        let count = self.store.incr_with_ttl(&key, policy.window).await?;
        if count > u64::from(policy.ceiling) {
            tracing::debug!("Client <{}> is rate limited by {} policy", ip, policy.name);
            return Ok(policy.on_exceed);
        }
        Ok(Decision::Allow)
    }
}
