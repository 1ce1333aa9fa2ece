//! Frame timing and delta time.
//!
//! [`Time`] is owned by the [`Engine`](crate::engine::Engine) and advanced once
//! per scheduler tick by [`Engine::frame`](crate::engine::Engine::frame). Hosts
//! that drive the loop themselves pass an explicit delta to
//! [`Engine::tick`](crate::engine::Engine::tick) instead.

use std::time::{Duration, Instant};

/// Frame timing state.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// When the engine started.
    startup: Instant,
    /// When the current frame started.
    frame_start: Instant,
    /// Duration of the previous frame.
    delta: Duration,
    /// Total time since startup.
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Measure the wall-clock time since the previous call.
    pub(crate) fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.frame_start;
        self.frame_start = now;
        self.elapsed = now - self.startup;
        self.frame_count += 1;
    }

    /// Record a frame of known length (used by [`Engine::tick`](crate::engine::Engine::tick)).
    /// Negative, NaN and unrepresentable deltas record as zero.
    pub(crate) fn advance(&mut self, delta_secs: f32) {
        self.delta = Duration::try_from_secs_f32(delta_secs.max(0.0)).unwrap_or(Duration::ZERO);
        self.elapsed = self.elapsed.saturating_add(self.delta);
        self.frame_start = Instant::now();
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total simulated time.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames ticked so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut time = Time::new();
        time.advance(0.5);
        time.advance(0.25);
        assert_eq!(time.frame_count(), 2);
        assert!((time.elapsed_secs() - 0.75).abs() < 1e-6);
        assert!((time.fps() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn negative_delta_clamps_to_zero() {
        let mut time = Time::new();
        time.advance(-1.0);
        assert_eq!(time.delta_secs(), 0.0);
        assert_eq!(time.fps(), 0.0);
    }

    #[test]
    fn non_finite_delta_records_zero() {
        let mut time = Time::new();
        time.advance(f32::INFINITY);
        time.advance(f32::NAN);
        assert_eq!(time.frame_count(), 2);
        assert_eq!(time.delta_secs(), 0.0);
        assert_eq!(time.elapsed_secs(), 0.0);
    }
}
