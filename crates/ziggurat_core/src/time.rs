#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Simulation clock.
///
/// Driven either by the wall clock ([`Timer::tick`]) or by explicit steps
/// ([`Timer::advance`]), which keeps tests and replays deterministic. The
/// animation system only ever reads [`Timer::now`], an `f32` in seconds.
#[derive(Debug, Clone)]
pub struct Timer {
    last_update: Instant,
    /// Length of the most recent step
    pub delta: Duration,
    /// Total simulated time
    pub elapsed: Duration,
    /// Number of steps taken
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Steps by the wall-clock time since the previous tick, scaled by `time_scale`.
    pub fn tick(&mut self, time_scale: f32) {
        let now = Instant::now();
        let real = now - self.last_update;
        self.last_update = now;
        self.advance(scale_duration(real, time_scale));
    }

    /// Steps by an explicit amount of simulated time.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Current simulated time in seconds.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// `real * time_scale`. Unusable scales and overflowing products give zero.
fn scale_duration(real: Duration, time_scale: f32) -> Duration {
    if !time_scale.is_finite() || time_scale <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(real.as_secs_f32() * time_scale).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut timer = Timer::new();
        timer.advance(Duration::from_millis(250));
        timer.advance(Duration::from_millis(500));
        assert_eq!(timer.frame_count, 2);
        assert!((timer.now() - 0.75).abs() < 1e-6);
        assert!((timer.dt_seconds() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn scaling_handles_degenerate_time_scales() {
        let real = Duration::from_millis(100);
        assert!((scale_duration(real, 2.0).as_secs_f32() - 0.2).abs() < 1e-6);
        assert_eq!(scale_duration(real, f32::INFINITY), Duration::ZERO);
        assert_eq!(scale_duration(real, f32::NAN), Duration::ZERO);
        assert_eq!(scale_duration(real, -1.0), Duration::ZERO);
        assert_eq!(scale_duration(real, f32::MAX), Duration::ZERO);
    }

    #[test]
    fn tick_with_infinite_scale_does_not_advance() {
        let mut timer = Timer::new();
        timer.tick(f32::INFINITY);
        timer.tick(f32::MAX);
        assert_eq!(timer.frame_count, 2);
        assert_eq!(timer.now(), 0.0);
    }
}
