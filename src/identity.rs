//! Participant identity with an explicit freshness window
//!
//! Identity comes from an external provider. The answer is cached on the
//! context for a fixed window measured on the injected clock; nothing is
//! stored process-wide.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};

/// Default freshness window: five minutes
pub const DEFAULT_FRESHNESS_MS: u64 = 5 * 60 * 1000;

/// Environment variable read by [`EnvIdentity`]
pub const USER_ENV_VAR: &str = "COGNITIVE_TESTKIT_USER";

/// An identified participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
}

/// Source of the current participant
pub trait IdentityProvider {
    fn fetch_current_user(&self) -> Option<UserIdentity>;
}

/// Reads the participant id from [`USER_ENV_VAR`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvIdentity;

impl IdentityProvider for EnvIdentity {
    fn fetch_current_user(&self) -> Option<UserIdentity> {
        std::env::var(USER_ENV_VAR)
            .ok()
            .filter(|id| !id.trim().is_empty())
            .map(|id| UserIdentity { id })
    }
}

#[derive(Debug, Clone)]
struct CachedUser {
    user: Option<UserIdentity>,
    fetched_at: u64,
}

/// Cached view of the current participant
#[derive(Debug)]
pub struct IdentityContext<C: Clock, P: IdentityProvider> {
    clock: C,
    provider: P,
    freshness_ms: u64,
    cached: Option<CachedUser>,
}

impl<C: Clock, P: IdentityProvider> IdentityContext<C, P> {
    pub fn new(clock: C, provider: P) -> Self {
        Self::with_freshness(clock, provider, DEFAULT_FRESHNESS_MS)
    }

    pub fn with_freshness(clock: C, provider: P, freshness_ms: u64) -> Self {
        Self {
            clock,
            provider,
            freshness_ms,
            cached: None,
        }
    }

    fn is_fresh(&self, now: u64) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|c| now.saturating_sub(c.fetched_at) < self.freshness_ms)
    }

    /// Current participant, refetched once the cache is stale
    pub fn current_user(&mut self) -> Option<&UserIdentity> {
        let now = self.clock.now_ms();
        if !self.is_fresh(now) {
            let user = self.provider.fetch_current_user();
            log::debug!("identity refreshed: {:?}", user.as_ref().map(|u| &u.id));
            self.cached = Some(CachedUser {
                user,
                fetched_at: now,
            });
        }
        self.cached.as_ref().and_then(|c| c.user.as_ref())
    }

    /// Whether a participant is associated with this session
    pub fn has_user(&mut self) -> bool {
        self.current_user().is_some()
    }

    /// Drop the cached answer; the next read refetches
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
