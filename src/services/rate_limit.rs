//! Fixed-window request limiting keyed by (policy, client address).
//!
//! Counters live behind the [`CounterStore`] trait so the limiter can be
//! swapped for a shared backend without touching the HTTP layer.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::{RateLimitConfig, RatePolicy};

/// Which budget a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateScope {
    Default,
    Register,
    Login,
}

impl RateScope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

/// Counter state after recording one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u32,
    pub resets_in: Duration,
}

pub trait CounterStore: Send + Sync {
    /// Increments the counter for `key`, starting a fresh window when the
    /// previous one has elapsed.
    fn hit(&self, key: &str, window: Duration, now: Instant) -> WindowCount;

    /// Drops windows that ended before `now`.
    fn purge_expired(&self, now: Instant);
}

struct Window {
    started: Instant,
    length: Duration,
    count: u32,
}

#[derive(Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn hit(&self, key: &str, window: Duration, now: Instant) -> WindowCount {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            length: window,
            count: 0,
        });

        if now.duration_since(entry.started) >= entry.length {
            entry.started = now;
            entry.length = window;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);

        WindowCount {
            count: entry.count,
            resets_in: entry
                .length
                .saturating_sub(now.duration_since(entry.started)),
        }
    }

    fn purge_expired(&self, now: Instant) {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        windows.retain(|_, w| now.duration_since(w.started) < w.length);
    }
}

/// Outcome of a limit check, carried into response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
    trusted_proxies: Vec<IpAddr>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig, store: Arc<dyn CounterStore>) -> Self {
        let trusted_proxies = config
            .trusted_proxy_ips
            .iter()
            .filter_map(|ip| match ip.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(ip = %ip, "Ignoring invalid trusted proxy address");
                    None
                }
            })
            .collect();

        Self {
            store,
            config,
            trusted_proxies,
        }
    }

    #[must_use]
    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(config, Arc::new(MemoryCounterStore::new()))
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub const fn policy(&self, scope: RateScope) -> RatePolicy {
        match scope {
            RateScope::Default => self.config.default,
            RateScope::Register => self.config.register,
            RateScope::Login => self.config.login,
        }
    }

    /// The address a request is counted against. Forwarded headers are only
    /// honoured when the socket peer is a trusted proxy.
    #[must_use]
    pub fn client_key(&self, peer: Option<IpAddr>, forwarded_for: Option<&str>) -> String {
        let forwarded = forwarded_for
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .and_then(|value| value.parse::<IpAddr>().ok());

        match (peer, forwarded) {
            (Some(peer), Some(client)) if self.trusted_proxies.contains(&peer) => {
                client.to_string()
            }
            (Some(peer), _) => peer.to_string(),
            (None, _) => "unknown".to_string(),
        }
    }

    /// Records one request and reports whether it fits the budget.
    /// Returns `None` when limiting is disabled.
    #[must_use]
    pub fn check(&self, scope: RateScope, client: &str) -> Option<RateDecision> {
        self.check_at(scope, client, Instant::now())
    }

    #[must_use]
    pub fn check_at(&self, scope: RateScope, client: &str, now: Instant) -> Option<RateDecision> {
        if !self.config.enabled {
            return None;
        }

        let policy = self.policy(scope);
        let key = format!("{}:{client}", scope.as_str());
        let window = self
            .store
            .hit(&key, Duration::from_secs(policy.window_seconds), now);

        let allowed = window.count <= policy.max_requests;
        let retry_after_secs = if allowed {
            0
        } else {
            (window.resets_in.as_secs_f64().ceil() as u64).max(1)
        };

        Some(RateDecision {
            allowed,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(window.count),
            retry_after_secs,
        })
    }

    pub fn purge_expired(&self) {
        self.store.purge_expired(Instant::now());
    }
}
