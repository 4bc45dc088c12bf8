use dashmap::DashMap;

// One hour
pub const WINDOW_DURATION_MS: u64 = 60 * 60 * 1000;
pub const MAX_REQUESTS_PER_WINDOW: u32 = 20;

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u32,
    pub window_start: u64, // ms since epoch
}

// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub count: u32, // count after this request was added
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

// Per-client fixed-window counter. A burst straddling a reset can get 2x max_requests through.
pub struct RateLimiter {
    store: DashMap<String, WindowState>,
    window_ms: u64,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            store: DashMap::new(),
            window_ms,
            max_requests,
        }
    }

    // Every call increments, including the ones that end up denied
    pub fn check(&self, key: &str, now: u64) -> Decision {
        // entry() holds the shard lock until `entry` is dropped
        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert(WindowState {
                count: 0,
                window_start: now,
            });

        // window expired..? reset it
        if now.saturating_sub(entry.window_start) > self.window_ms {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        Decision {
            allowed: entry.count <= self.max_requests,
            count: entry.count,
        }
    }

    // Drop entries whose window ended more than `grace_windows` windows ago.
    // Such an entry would be reset by its next check anyway.
    pub fn sweep(&self, now: u64, grace_windows: u64) -> usize {
        let horizon = self.window_ms.saturating_mul(grace_windows.saturating_add(1));
        let before = self.store.len();
        self.store
            .retain(|_, state| now.saturating_sub(state.window_start) <= horizon);
        before.saturating_sub(self.store.len())
    }

    pub fn state(&self, key: &str) -> Option<WindowState> {
        self.store.get(key).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_REQUESTS_PER_WINDOW, WINDOW_DURATION_MS)
    }
}
