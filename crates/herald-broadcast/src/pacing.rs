//! Outbound rate-limiting policies.
//!
//! The dispatcher calls [`Pacer::pace`] once after every delivery attempt.
//! A pacer shared between dispatchers (or between overlapping runs) gates
//! all of them together, which is what a per-credential transport limit
//! needs.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pace(&self);
}

/// Hard sequential throttle: sleep a fixed interval after each attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

#[async_trait]
impl Pacer for FixedInterval {
    async fn pace(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pace(&self) {}
}

/// Token bucket: bursts up to `capacity`, then one token every
/// `1 / refill_per_sec` seconds. Starts full.
///
/// `refill_per_sec` is clamped to `[MIN_REFILL_PER_SEC, MAX_REFILL_PER_SEC]`;
/// NaN is treated as the minimum.
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// One token every ~17 minutes.
    pub const MIN_REFILL_PER_SEC: f64 = 1e-3;
    pub const MAX_REFILL_PER_SEC: f64 = 1e6;

    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let capacity = f64::from(capacity.max(1));
        let refill_per_sec = if refill_per_sec.is_nan() {
            Self::MIN_REFILL_PER_SEC
        } else {
            refill_per_sec.clamp(Self::MIN_REFILL_PER_SEC, Self::MAX_REFILL_PER_SEC)
        };
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// `rate` messages per second with a one-second burst.
    pub fn per_second(rate: u32) -> Self {
        let rate = rate.max(1);
        Self::new(rate, f64::from(rate))
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}

#[async_trait]
impl Pacer for TokenBucket {
    async fn pace(&self) {
        // The lock is held across the sleep so waiters queue up in order.
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens < 1.0 {
            let deficit = 1.0 - state.tokens;
            tokio::time::sleep(Duration::from_secs_f64(deficit / self.refill_per_sec)).await;
            self.refill(&mut state);
        }

        state.tokens = (state.tokens - 1.0).max(0.0);
    }
}
