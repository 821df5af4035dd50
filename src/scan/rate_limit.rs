use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{RateLimiterKind, ScanConfig};

/// Paces upstream provider traffic. `acquire` returns once the caller may issue
/// its next request.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn acquire(&self);
}

/// Keeps at least `delay` between consecutive acquisitions. The first one is
/// immediate.
pub struct FixedDelay {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.delay).await;
        }
        *last = Some(Instant::now());
    }
}

struct BucketState {
    tokens: f64,
    refilled_at: Instant,
}

/// Classic token bucket: bursts up to `capacity`, then `refill_per_sec`.
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: capacity as f64,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity as f64,
                refilled_at: Instant::now(),
            }),
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.refilled_at).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.refilled_at = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }
}

/// Build the limiter selected in `[scan]`.
pub fn from_config(config: &ScanConfig) -> Arc<dyn RateLimiter> {
    match config.rate_limiter {
        RateLimiterKind::FixedDelay => {
            Arc::new(FixedDelay::new(Duration::from_millis(config.chain_delay_ms)))
        }
        RateLimiterKind::TokenBucket => {
            Arc::new(TokenBucket::new(config.bucket_capacity, config.refill_per_sec))
        }
    }
}
