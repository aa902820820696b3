use serde::Serialize;

/// Point-in-time snapshot of queue occupancy. Observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Requests waiting for a concurrency slot.
    pub waiting_count: usize,
    /// Requests occupying a slot (attempting or backing off).
    pub active_count: usize,
    /// Maximum number of simultaneously active requests.
    pub concurrency_limit: usize,
}

impl QueueStatus {
    /// True when nothing is waiting or running.
    pub fn is_idle(&self) -> bool {
        self.waiting_count == 0 && self.active_count == 0
    }

    /// Free concurrency slots.
    pub fn available(&self) -> usize {
        self.concurrency_limit.saturating_sub(self.active_count)
    }
}
