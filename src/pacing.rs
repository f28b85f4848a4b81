//! Frame pacing shared by the emulation loop and the rebind window

use std::time::{Duration, Instant};

/// Target iteration rate of both loops
pub const FPS: u32 = 60;

/// Enforces a minimum duration per loop iteration
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    period: Duration,
}

impl FramePacer {
    pub fn new(fps: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / fps as f64),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left in the frame; zero once the frame has overrun
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.period.saturating_sub(elapsed)
    }

    /// Sleep out the rest of a frame started at `frame_start`
    pub fn wait(&self, frame_start: Instant) {
        let remaining = self.remaining(frame_start.elapsed());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(FPS)
    }
}
