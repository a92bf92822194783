use std::time::{Duration, Instant};

/// Minimum-interval gate for refresh cycles.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    last: Option<Instant>,
    min_interval: Duration,
}

impl RefreshGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last: None,
            min_interval,
        }
    }

    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now())
    }

    pub fn allow_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}
