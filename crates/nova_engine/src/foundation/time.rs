//! Time management utilities
//!
//! [`FixedTimestepLoop`] turns variable-rate frame callbacks into zero or more
//! constant-length simulation steps. It is the only clock the simulation sees.

/// Default clamp applied to a single frame's elapsed time, in seconds
pub const DEFAULT_MAX_FRAME_TIME: f64 = 0.25;

/// Outcome of one [`FixedTimestepLoop::advance`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Number of simulation steps executed during the call
    pub steps: u32,
    /// Leftover accumulated time as a fraction of one step, in `[0, 1]`
    pub alpha: f32,
}

impl StepReport {
    const IDLE: Self = Self { steps: 0, alpha: 0.0 };
}

/// Fixed-timestep accumulator loop
///
/// Accumulates wall-clock time between calls and invokes the step callback
/// once per whole step held in the bucket, up to `max_sub_steps` per call.
/// Time that could not be stepped is carried to the next call; the only time
/// ever thrown away is the excess cut by the per-frame clamp.
#[derive(Debug, Clone)]
pub struct FixedTimestepLoop {
    step_hz: f64,
    fixed_dt: f64,
    max_sub_steps: u32,
    max_frame_time: f64,
    last_timestamp: Option<f64>,
    accumulator: f64,
    total_steps: u64,
}

impl FixedTimestepLoop {
    /// Create a loop stepping at `step_hz` with at most `max_sub_steps` steps per call
    pub fn new(step_hz: f64, max_sub_steps: u32) -> Self {
        let step_hz = if step_hz > 0.0 { step_hz } else { 60.0 };
        Self {
            step_hz,
            fixed_dt: 1.0 / step_hz,
            max_sub_steps: max_sub_steps.max(1),
            max_frame_time: DEFAULT_MAX_FRAME_TIME,
            last_timestamp: None,
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Override the elapsed-time clamp
    pub fn with_max_frame_time(mut self, seconds: f64) -> Self {
        self.max_frame_time = seconds.max(self.fixed_dt);
        self
    }

    /// Simulation rate in steps per second
    pub fn step_hz(&self) -> f64 {
        self.step_hz
    }

    /// Length of one step in seconds
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt as f32
    }

    /// Factor that converts a per-tick constant into one scaled for `dt`
    pub fn step_scale(&self, dt: f32) -> f32 {
        dt * self.step_hz as f32
    }

    /// Time currently waiting in the accumulator, in seconds
    pub fn pending_time(&self) -> f64 {
        self.accumulator
    }

    /// Total steps executed since construction
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Forget the timestamp baseline, e.g. after the host resumed from suspension
    pub fn reset_baseline(&mut self) {
        self.last_timestamp = None;
    }

    /// Advance the loop to `now` (seconds) and run due steps
    ///
    /// The first call after construction (or [`reset_baseline`](Self::reset_baseline))
    /// only records the baseline and reports zero steps.
    pub fn advance<F: FnMut(f32)>(&mut self, now: f64, mut step_fn: F) -> StepReport {
        let Some(previous) = self.last_timestamp.replace(now) else {
            return StepReport::IDLE;
        };

        let mut elapsed = (now - previous).max(0.0);
        if elapsed > self.max_frame_time {
            log::warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                elapsed * 1000.0,
                self.max_frame_time * 1000.0
            );
            elapsed = self.max_frame_time;
        }
        self.accumulator += elapsed;

        let dt = self.fixed_dt as f32;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_sub_steps {
            step_fn(dt);
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }
        self.total_steps += u64::from(steps);

        if steps == self.max_sub_steps && self.accumulator >= self.fixed_dt {
            log::trace!(
                "Sub-step cap reached, carrying {:.1}ms to next frame",
                self.accumulator * 1000.0
            );
        }

        StepReport {
            steps,
            alpha: (self.accumulator / self.fixed_dt).min(1.0) as f32,
        }
    }
}
