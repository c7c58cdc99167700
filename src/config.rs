// --- File: config.rs ---
use crate::constants::*;
use crate::error::{SimError, SimResult};
use crate::utils::lerp;

/// Step rates (steps per second) at the two ends of the speed slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    pub min_rate: f32,
    pub max_rate: f32,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            min_rate: DEFAULT_MIN_STEP_RATE,
            max_rate: DEFAULT_MAX_STEP_RATE,
        }
    }
}

impl SpeedLimits {
    pub fn new(min_rate: f32, max_rate: f32) -> Self {
        Self { min_rate, max_rate }
    }

    // The slider interpolates periods, not rates.
    pub fn interval_for_speed(&self, speed: f32) -> f32 {
        lerp(1.0 / self.min_rate, 1.0 / self.max_rate, speed)
    }

    fn validate(&self) -> SimResult<()> {
        for (name, rate) in [("min_rate", self.min_rate), ("max_rate", self.max_rate)] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(SimError::Config(format!(
                    "{name} must be a positive finite step rate, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Cells per grid side. Fixed for the lifetime of an engine.
    pub resolution: u32,
    /// Number of color cubes tiled along each axis of the seed pattern.
    pub color_cube_count: u32,
    pub speed_limits: SpeedLimits,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            color_cube_count: DEFAULT_COLOR_CUBE_COUNT,
            speed_limits: SpeedLimits::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_color_cube_count(mut self, color_cube_count: u32) -> Self {
        self.color_cube_count = color_cube_count;
        self
    }

    pub fn with_speed_limits(mut self, min_rate: f32, max_rate: f32) -> Self {
        self.speed_limits = SpeedLimits::new(min_rate, max_rate);
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.resolution == 0 {
            return Err(SimError::Config("resolution must be at least 1".into()));
        }
        if self.color_cube_count == 0 || self.color_cube_count > self.resolution {
            return Err(SimError::Config(format!(
                "color_cube_count must be in 1..={}, got {}",
                self.resolution, self.color_cube_count
            )));
        }
        // Rates are not required to be ordered; a reversed pair just inverts the slider.
        self.speed_limits.validate()
    }

    /// Side length of one color cube, in cells. Integer division, then widened.
    pub fn color_cube_size(&self) -> f32 {
        (self.resolution / self.color_cube_count) as f32
    }

    pub fn cell_count(&self) -> usize {
        (self.resolution as usize) * (self.resolution as usize)
    }
}


// --- End of File: config.rs ---
