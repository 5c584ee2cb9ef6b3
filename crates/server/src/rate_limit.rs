//! Per-key token buckets used to throttle login attempts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const UNKNOWN_CLIENT: &str = "unknown";
const MIN_IDLE: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: f64::from(capacity),
            tokens: f64::from(capacity),
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.refill(Instant::now());
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.duration_since(self.last_refill)
    }
}

/// Token bucket per client key (IP address).
#[derive(Clone)]
pub struct KeyedRateLimiter {
    buckets: Arc<DashMap<String, TokenBucket>>,
    burst: u32,
    refill_per_sec: f64,
    enabled: bool,
    trust_forwarded_for: bool,
}

impl KeyedRateLimiter {
    pub fn new(requests_per_minute: u32, burst: u32, enabled: bool) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            burst: burst.max(1),
            refill_per_sec: f64::from(requests_per_minute) / 60.0,
            enabled,
            trust_forwarded_for: false,
        }
    }

    pub fn from_config(cfg: &configs::RateLimitConfig) -> Self {
        Self {
            trust_forwarded_for: cfg.trust_forwarded_for,
            ..Self::new(cfg.login_requests_per_minute, cfg.login_burst, cfg.enabled)
        }
    }

    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Bucket key for a request: the peer address, or the forwarded client when the proxy is trusted.
    pub fn key_for(&self, forwarded: Option<&str>, peer: Option<&str>) -> String {
        let forwarded = forwarded.filter(|_| self.trust_forwarded_for);
        forwarded.or(peer).unwrap_or(UNKNOWN_CLIENT).to_string()
    }

    /// Time after which an untouched bucket is full again, so dropping it changes nothing.
    pub fn refill_window(&self) -> Duration {
        if self.refill_per_sec <= 0.0 {
            return Duration::from_secs(3600);
        }
        Duration::from_secs((f64::from(self.burst) / self.refill_per_sec).round() as u64).max(MIN_IDLE)
    }

    pub fn check(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst, self.refill_per_sec));
        let allowed = bucket.try_acquire();
        if allowed {
            debug!(key, "rate limit token acquired");
        } else {
            warn!(key, "rate limit exceeded");
        }
        allowed
    }

    /// Drops buckets untouched for longer than `idle`.
    pub fn prune(&self, idle: Duration) {
        let now = Instant::now();
        self.buckets.retain(|_, b| b.idle_for(now) < idle);
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

/// Prunes buckets idle for longer than `idle`, every `every`.
pub fn spawn_pruner(limiter: KeyedRateLimiter, every: Duration, idle: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), idle_secs = idle.as_secs(), "rate limiter pruning started");
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let before = limiter.tracked_keys();
            limiter.prune(idle);
            debug!(before, after = limiter.tracked_keys(), "rate limiter pruned");
        }
    })
}
