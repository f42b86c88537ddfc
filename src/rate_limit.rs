use std::collections::HashMap;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::configuration::RateLimitSettings;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Rate limit exceeded. Please try again later.")]
pub struct RateLimited;

#[derive(Clone, Copy, Debug)]
struct Counter {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Fixed-window request counter, keyed by client identity (we use the peer
/// IP). Purely process-local and best-effort: counters do not survive a
/// restart and are not shared between instances, which is acceptable here
/// since nothing downstream requires durable limiting.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    counters: Mutex<HashMap<String, Counter>>,
}

impl RateLimiter {
    pub fn new(cfg: &RateLimitSettings) -> Self {
        Self {
            max_requests: cfg.max_requests,
            window: Duration::seconds(cfg.window_seconds),
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request for `key`. Admits exactly `max_requests` per window;
    /// the counter resets once the window has elapsed.
    pub fn check(
        &self,
        key: &str,
    ) -> Result<(), RateLimited> {
        self.check_at(key, Utc::now())
    }

    fn check_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RateLimited> {
        let mut counters = self.counters.lock().unwrap();

        let counter = counters.entry(key.to_string()).or_insert(Counter {
            window_start: now,
            count: 0,
        });

        if now - counter.window_start >= self.window {
            counter.window_start = now;
            counter.count = 0;
        }

        if counter.count >= self.max_requests {
            tracing::warn!(key = %key, count = counter.count, "rate limit exceeded");
            return Err(RateLimited);
        }

        counter.count += 1;
        Ok(())
    }
}
