use std::collections::VecDeque;

/// Frames-per-second over a rolling one-second window of host timestamps.
#[derive(Debug, Default)]
pub struct FrameClock {
    stamps: VecDeque<f64>,
}

const WINDOW_SECS: f64 = 1.0;

impl FrameClock {
    /// An empty clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame presented at `now` seconds. A timestamp earlier than the last one restarts
    /// the window.
    pub fn tick(&mut self, now: f64) {
        if !now.is_finite() {
            return;
        }
        if self.stamps.back().is_some_and(|&last| now < last) {
            self.stamps.clear();
        }
        self.stamps.push_back(now);
        while self
            .stamps
            .front()
            .is_some_and(|&first| now - first >= WINDOW_SECS)
        {
            self.stamps.pop_front();
        }
    }

    /// Frames recorded within the last second.
    pub fn fps(&self) -> f32 {
        self.stamps.len() as f32
    }

    /// Forget every recorded frame.
    pub fn reset(&mut self) {
        self.stamps.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/frame_clock.rs"]
mod tests;
