//! Fixed-window rate limiting per client identity.
//!
//! Each caller gets `max_requests` per window. The first request of a window
//! creates the entry; later requests increment it; the request that pushes
//! the count past the maximum is itself rejected. Expired entries are swept
//! before each lookup and by a periodic background task, so memory tracks
//! the number of recent callers rather than total traffic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::identity::ClientIdentity;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Time source for window arithmetic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("mock clock mutex poisoned");
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("mock clock mutex poisoned")
    }
}

/// Counter state for one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_reset_at
    }
}

/// Outcome of a rate-limit check, including what to report in headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Whole seconds until the window resets; set only on rejection.
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    /// Write the limit/remaining/reset triple (and Retry-After when rejected).
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(LIMIT_HEADER, HeaderValue::from(self.limit));
        headers.insert(REMAINING_HEADER, HeaderValue::from(self.remaining));
        if let Ok(reset) =
            HeaderValue::from_str(&self.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true))
        {
            headers.insert(RESET_HEADER, reset);
        }
        if let Some(secs) = self.retry_after_secs {
            headers.insert(RETRY_AFTER_HEADER, HeaderValue::from(secs));
        }
    }
}

/// Process-wide rate-limit state, one entry per caller.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: DashMap<ClientIdentity, RateLimitEntry>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `identity`, starting a new window if needed.
    /// Returns the entry as it stands after the increment.
    pub fn record(&self, identity: &ClientIdentity, now: DateTime<Utc>, window: chrono::Duration) -> RateLimitEntry {
        let fresh = RateLimitEntry {
            count: 0,
            window_reset_at: now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self.entries.entry(identity.clone()).or_insert(fresh);
        if entry.is_expired(now) {
            *entry = fresh;
        }
        entry.count = entry.count.saturating_add(1);
        *entry
    }

    /// Drop every entry whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn get(&self, identity: &ClientIdentity) -> Option<RateLimitEntry> {
        self.entries.get(identity).map(|e| *e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fixed-window limiter over a [`RateLimitStore`].
pub struct RateLimiter {
    store: RateLimitStore,
    clock: Arc<dyn Clock>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RateLimitStore::new(),
            clock,
            max_requests: config.max_requests,
            window: Duration::from_millis(config.window_ms),
        }
    }

    pub fn store(&self) -> &RateLimitStore {
        &self.store
    }

    /// Sweep expired entries, then count this request.
    pub fn check(&self, identity: &ClientIdentity) -> RateLimitDecision {
        let now = self.clock.now();
        self.store.sweep(now);

        let window = chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX);
        let entry = self.store.record(identity, now, window);

        if entry.count > self.max_requests {
            let millis_left = (entry.window_reset_at - now).num_milliseconds().max(0) as u64;
            let retry_after = millis_left.div_ceil(1000).max(1);

            tracing::warn!(
                client = %identity,
                requests = entry.count,
                limit = self.max_requests,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited("fixed_window");

            return RateLimitDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                reset_at: entry.window_reset_at,
                retry_after_secs: Some(retry_after),
            };
        }

        RateLimitDecision {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - entry.count,
            reset_at: entry.window_reset_at,
            retry_after_secs: None,
        }
    }

    /// Sweep using the limiter's clock.
    pub fn sweep(&self) -> usize {
        self.store.sweep(self.clock.now())
    }

    /// Periodically sweep until shutdown so idle callers don't linger.
    pub fn spawn_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.window.min(MAX_SWEEP_INTERVAL));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = self.store.len(), "Swept expired rate limit entries");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}
