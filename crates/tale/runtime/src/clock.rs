//! Turns raw elapsed time into scheduler time steps.

use tale_core::TimeStep;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    time_scale: f32,
    frames: u64,
    elapsed: f64,
}

impl FrameClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            time_scale: sanitize(time_scale),
            frames: 0,
            elapsed: 0.0,
        }
    }

    /// Produces the step for a frame that took `raw_delta` seconds.
    ///
    /// Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, raw_delta: f32) -> TimeStep {
        let unscaled = sanitize(raw_delta);
        self.frames += 1;
        self.elapsed += f64::from(unscaled);
        TimeStep::new(unscaled * self.time_scale, unscaled)
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// `0.0` pauses scaled time; unscaled actions keep running.
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = sanitize(time_scale);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Unscaled seconds since the clock started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
