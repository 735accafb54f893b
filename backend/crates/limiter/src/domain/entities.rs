//! Domain Entities

/// Per-client fixed-window state held in the counter store
///
/// Created lazily on a client's first request and overwritten on every
/// later one. Records are never deleted here; expiry is up to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRecord {
    /// Unix timestamp (seconds) at which the current window began
    pub window_start: i64,
    /// Requests counted since `window_start`, excluding the opening one
    pub count: u32,
}

impl WindowRecord {
    /// A fresh window starting at `now`
    pub fn open(now: i64) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Same window with one more request counted
    pub fn incremented(&self) -> Self {
        Self {
            window_start: self.window_start,
            count: self.count.saturating_add(1),
        }
    }

    /// Seconds between the window start and `now`
    pub fn elapsed(&self, now: i64) -> i64 {
        now.saturating_sub(self.window_start)
    }
}
