use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide token bucket bounding the outbound request rate.
///
/// Tokens refill continuously at `rps` per second up to `burst` capacity.
/// The count never exceeds capacity and never goes negative.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    fill_rate: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a bucket starting full.
    ///
    /// Capacity is clamped to at least one token and the fill rate to a
    /// small positive floor, so a zero-valued config cannot stall the run.
    pub fn new(rps: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            capacity,
            fill_rate: rps.max(0.05),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Suspends the caller until a token is available, then consumes it.
    ///
    /// When the bucket is empty the exact deficit wait is computed and slept
    /// before re-checking; waiting never burns a thread.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;

                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.last_refill = now;
                state.tokens = (state.tokens + elapsed * self.fill_rate).min(self.capacity);

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }

                Duration::from_secs_f64((1.0 - state.tokens) / self.fill_rate)
            };

            tracing::trace!("Rate limiter sleeping {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
