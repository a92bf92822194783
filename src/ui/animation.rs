use std::time::{Duration, Instant};

/// Ease-in-out quadratic on `t` in [0, 1]; input outside the range is clamped.
pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Eased interpolation between the displayed value and a new target.
#[derive(Debug, Clone, Copy)]
pub struct CounterAnimation {
    from: i64,
    to: i64,
    started: Instant,
    duration: Duration,
}

impl CounterAnimation {
    pub fn new(from: i64, to: i64, duration: Duration, started: Instant) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    pub fn settled(value: i64, now: Instant) -> Self {
        Self::new(value, value, Duration::ZERO, now)
    }

    pub fn target(&self) -> i64 {
        self.to
    }

    pub fn value_at(&self, now: Instant) -> i64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started);
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        if t >= 1.0 {
            return self.to;
        }
        let span = (self.to - self.from) as f64;
        self.from + (span * ease_in_out_quad(t)).round() as i64
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.value_at(now) == self.to && now.saturating_duration_since(self.started) >= self.duration
    }

    /// Start a new run from whatever is on screen right now.
    pub fn retarget(&mut self, to: i64, now: Instant) {
        if to == self.to {
            return;
        }
        self.from = self.value_at(now);
        self.to = to;
        self.started = now;
    }
}
