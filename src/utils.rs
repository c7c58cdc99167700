// --- File: utils.rs ---
use glam::Vec4;

// --- Helper Functions ---

/// Unclamped linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Initial state of the cell at `(x, y)` when the grid is tiled with
/// color cubes of `cube_size` cells per side. The toggle channel starts at 0.
pub fn seed_state(x: f32, y: f32, cube_size: f32) -> Vec4 {
    let r = lerp(-1.0, 1.0, (x % cube_size) / cube_size).abs();
    let g = lerp(-1.0, 1.0, (y % cube_size) / cube_size).abs();
    let b = 1.0 - (r + g) / 2.0;
    Vec4::new(r, g, b, 0.0)
}


// --- End of File: utils.rs ---
