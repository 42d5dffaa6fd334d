//! Per-caller token-bucket admission control.
//!
//! Buckets accumulate `rate_per_sec` tokens up to `burst`; each admitted
//! request consumes one. Buckets are created lazily per caller key (client
//! IP in practice) and swept once they have been idle longer than
//! `idle_after`, so memory stays bounded without resetting active callers'
//! accumulated state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(burst: f64, now: Instant) -> Self {
        Self {
            tokens: burst,
            last_refill: now,
        }
    }

    /// Refill proportionally to elapsed time, then consume one token if
    /// available. One call, one critical section: callers hold the map lock
    /// across this so concurrent requests cannot lose updates.
    fn refill_and_consume(&mut self, rate_per_sec: f64, burst: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * rate_per_sec).min(burst);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

pub struct RateGovernor {
    buckets: Mutex<HashMap<String, Bucket>>,
    rate_per_sec: f64,
    burst: f64,
    idle_after: Duration,
}

impl RateGovernor {
    pub fn new(rate_per_sec: f64, burst: u32, idle_after: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            rate_per_sec,
            burst: f64::from(burst),
            idle_after,
        }
    }

    /// Admit or reject one request from `key`. First sight of a key gets a
    /// full bucket, so a fresh caller can burst up to `burst` requests.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().expect("bucket map lock poisoned");
        let bucket = buckets
            .entry(key.to_owned())
            .or_insert_with(|| Bucket::full(self.burst, now));
        bucket.refill_and_consume(self.rate_per_sec, self.burst, now)
    }

    /// How long a rejected caller should wait before one token is available.
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs((1.0 / self.rate_per_sec).ceil() as u64)
    }

    /// Drop buckets idle longer than `idle_after`. Active callers keep their
    /// state; only callers we have not seen for a full window are forgotten.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        let mut buckets = self.buckets.lock().expect("bucket map lock poisoned");
        buckets.retain(|_, b| now.saturating_duration_since(b.last_refill) < self.idle_after);
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().expect("bucket map lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `sweep` on a fixed interval. The sweep itself is synchronous and
    /// never holds the bucket lock across an await.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let governor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                governor.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(rate_per_sec: f64, burst: u32) -> RateGovernor {
        RateGovernor::new(rate_per_sec, burst, Duration::from_secs(600))
    }

    #[test]
    fn fresh_key_admits_burst_then_denies() {
        // rate = 5/min, burst = 10
        let g = governor(5.0 / 60.0, 10);
        let now = Instant::now();
        for i in 0..10 {
            assert!(g.allow_at("1.2.3.4", now), "request {i} should be admitted");
        }
        assert!(!g.allow_at("1.2.3.4", now), "11th request should be denied");
    }

    #[test]
    fn tokens_refill_with_elapsed_time() {
        let g = governor(5.0 / 60.0, 10);
        let start = Instant::now();
        for _ in 0..10 {
            assert!(g.allow_at("ip", start));
        }
        assert!(!g.allow_at("ip", start));

        // 12 seconds at 5/min refills one token.
        let later = start + Duration::from_secs(12);
        assert!(g.allow_at("ip", later));
        assert!(!g.allow_at("ip", later));
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let g = governor(100.0, 3);
        let start = Instant::now();
        assert!(g.allow_at("ip", start));

        // A long idle period must not bank more than `burst` tokens.
        let much_later = start + Duration::from_secs(3600);
        for _ in 0..3 {
            assert!(g.allow_at("ip", much_later));
        }
        assert!(!g.allow_at("ip", much_later));
    }

    #[test]
    fn keys_are_isolated() {
        let g = governor(1.0, 1);
        let now = Instant::now();
        assert!(g.allow_at("a", now));
        assert!(!g.allow_at("a", now));
        assert!(g.allow_at("b", now), "key b has its own bucket");
    }

    #[test]
    fn sweep_evicts_only_idle_buckets() {
        let g = RateGovernor::new(1.0, 5, Duration::from_secs(60));
        let start = Instant::now();
        g.allow_at("idle", start);
        g.allow_at("active", start + Duration::from_secs(55));
        assert_eq!(g.len(), 2);

        g.sweep_at(start + Duration::from_secs(70));
        assert_eq!(g.len(), 1, "only the idle bucket is evicted");

        // The surviving bucket kept its state: 4 tokens left plus 1 refilled
        // over the elapsed second.
        let now = start + Duration::from_secs(56);
        for _ in 0..5 {
            assert!(g.allow_at("active", now));
        }
        assert!(!g.allow_at("active", now));
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(
            governor(5.0 / 60.0, 10).retry_after(),
            Duration::from_secs(12)
        );
        assert_eq!(governor(2.0, 10).retry_after(), Duration::from_secs(1));
    }
}
