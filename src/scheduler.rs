// --- File: scheduler.rs ---
/// Fixed-interval step timer. Leftover time is dropped when a step fires,
/// so a long frame never schedules a catch-up step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepScheduler {
    elapsed: f32,
    interval: f32,
}

impl StepScheduler {
    pub fn new(interval: f32) -> Self {
        Self {
            elapsed: 0.0,
            interval,
        }
    }

    pub fn configure(&mut self, interval: f32) {
        self.interval = interval;
    }

    /// Accumulate `dt` seconds. Returns true, and clears the counter, once
    /// at least one interval has passed.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        self.elapsed += delta_time.max(0.0);
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn interval(&self) -> f32 {
        self.interval
    }
}


// --- End of File: scheduler.rs ---
