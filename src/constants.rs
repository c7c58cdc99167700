// --- File: constants.rs ---
// --- Global Simulation Constants ---

pub const DEFAULT_RESOLUTION: u32 = 64;
pub const DEFAULT_COLOR_CUBE_COUNT: u32 = 1;

// Steps per second at speed 0.0 and speed 1.0
pub const DEFAULT_MIN_STEP_RATE: f32 = 1.0;
pub const DEFAULT_MAX_STEP_RATE: f32 = 30.0;

// Start halfway between the two periods
pub const INITIAL_SPEED: f32 = 0.5;

// Must match @workgroup_size in the WGSL kernels
pub const WORKGROUP_SIZE: u32 = 64;

pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
pub const STATS_UPDATE_INTERVAL_SECS: f64 = 2.0;

// --- End of File: constants.rs ---
