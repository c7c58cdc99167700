// --- File: lib.rs ---
//! Double-buffered cellular automaton stepping engine.
//!
//! A [`SimulationEngine`] owns a ping-pong pair of grids, a fixed-interval
//! step timer and a run/pause controller. The transition rule runs on a
//! [`ComputeDevice`]: either [`CpuDevice`] (rayon) or [`GpuDevice`] (wgpu
//! compute shader).

pub mod buffer;
pub mod config;
pub mod constants;
pub mod controller;
pub mod device;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod scheduler;
pub mod simulation;
pub mod utils;

pub use buffer::{DoubleBuffer, Slot};
pub use config::{SimulationConfig, SpeedLimits};
pub use controller::{RunController, RunState};
pub use device::{ComputeDevice, CopyRule, CpuDevice, DispatchMode, TransitionRule};
pub use error::{SimError, SimResult};
pub use gpu::GpuDevice;
pub use grid::{Cell, Grid};
pub use scheduler::StepScheduler;
pub use simulation::{SimulationEngine, TickOutcome};

// --- End of File: lib.rs ---
