// --- File: error.rs ---
// Error types for the stepping engine.

use thiserror::Error;

/// Errors that can occur while configuring or driving a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// A grid coordinate or flat index outside `0..N`.
    #[error("cell ({x}, {y}) is outside the {resolution}x{resolution} grid")]
    OutOfBounds { x: u32, y: u32, resolution: u32 },

    /// An operation was attempted in a run state that forbids it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// `swap()` was called without a step having been dispatched first.
    #[error("buffer swap without a preceding step")]
    UnpairedSwap,

    /// Host and device disagree about buffer dimensions.
    #[error("grid size mismatch: expected {expected} cells, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Failed to request GPU adapter.
    #[error("failed to request GPU adapter")]
    AdapterNotFound,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Mapping a readback buffer failed.
    #[error("buffer readback failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    /// Kernel dispatch or any other device-side failure.
    #[error("device error: {0}")]
    Device(String),
}

/// Result type for engine operations.
pub type SimResult<T> = Result<T, SimError>;

// --- End of File: error.rs ---
