//! Frame clock.
//!
//! The engine only needs a monotonic elapsed value once per frame; the clock
//! also counts frames and keeps a periodically refreshed FPS figure for logs.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! // once per redraw:
//! let elapsed = clock.tick();
//! engine.frame(elapsed)?;
//! ```

use std::time::{Duration, Instant};

/// How often [`FrameClock::fps`] is recomputed.
const FPS_INTERVAL: Duration = Duration::from_millis(500);

/// Monotonic elapsed time, frame counter and FPS.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    elapsed_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            elapsed_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
        }
    }

    /// Advance one frame. Returns seconds since the clock was created.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        // Instants are monotonic, so elapsed never decreases.
        self.elapsed_secs = now.saturating_duration_since(self.start).as_secs_f32();
        self.frame_count += 1;

        let since = now.saturating_duration_since(self.fps_update_time);
        if since >= FPS_INTERVAL {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.elapsed_secs
    }

    /// Seconds since start, as of the last tick.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Frames ticked so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last measurement window; 0 until the first
    /// window closes.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether the last tick refreshed [`FrameClock::fps`].
    pub fn fps_updated(&self) -> bool {
        self.frame_count > 0 && self.fps_frame_count == self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.fps(), 0.0);
        assert!(!clock.fps_updated());
    }

    #[test]
    fn test_tick_is_monotonic() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let mut last = 0.0;
        for ms in [5, 10, 10, 40] {
            let elapsed = clock.tick_at(start + Duration::from_millis(ms));
            assert!(elapsed >= last);
            last = elapsed;
        }
        assert_eq!(clock.frame(), 4);
        assert!((clock.elapsed() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_fps_window() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for i in 1..=30 {
            clock.tick_at(start + Duration::from_millis(i * 1000 / 60));
        }
        assert!(clock.fps_updated());
        assert!((clock.fps() - 60.0).abs() < 1.0);

        clock.tick_at(start + Duration::from_millis(520));
        assert!(!clock.fps_updated());
    }
}
