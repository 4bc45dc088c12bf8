use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

use crate::metrics::RATE_LIMITER_KEYS;
use crate::state::{AppState, now_millis};

// Windows an entry may stay expired before it is dropped
const GRACE_WINDOWS: u64 = 1;

// Sweep function - drops stale rate limit entries on every tick
pub async fn rate_limit_sweeper(state: Arc<AppState>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    info!(interval = ?sweep_interval, "Rate limit sweeper started");

    loop {
        interval.tick().await;
        if state.rate_limiter.is_empty() {
            continue;
        }

        let removed = state.rate_limiter.sweep(now_millis(), GRACE_WINDOWS);
        RATE_LIMITER_KEYS.set(state.rate_limiter.len() as f64);

        if removed > 0 {
            debug!(
                removed,
                remaining = state.rate_limiter.len(),
                "Swept stale rate limit entries"
            );
        }
    }
}
