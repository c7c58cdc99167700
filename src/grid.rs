// --- File: grid.rs ---
use crate::error::{SimError, SimResult};
use crate::utils::seed_state;
use glam::{Vec2, Vec4};

// --- GPU Data Structure ---
// This struct MUST match the layout of `Cell` in the WGSL kernels.
// WGSL aligns vec4<f32> to 16 bytes, hence the padding after `position`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Cell {
    pub position: [f32; 2],
    pub _padding: [f32; 2],
    /// rgb plus the alive flag in the last channel (always 0.0 or 1.0).
    pub state: [f32; 4],
}

impl Cell {
    pub fn new(position: Vec2, state: Vec4) -> Self {
        Self {
            position: position.to_array(),
            _padding: [0.0; 2],
            state: state.to_array(),
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    #[inline]
    pub fn state(&self) -> Vec4 {
        Vec4::from_array(self.state)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state[3] != 0.0
    }

    pub fn with_alive(mut self, alive: bool) -> Self {
        self.state[3] = if alive { 1.0 } else { 0.0 };
        self
    }

    /// Copy of this cell with only the alive flag flipped.
    pub fn toggled(self) -> Self {
        let alive = self.is_alive();
        self.with_alive(!alive)
    }
}

/// Square `N x N` block of cells, indexed `x * N + y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    resolution: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid of zeroed cells carrying only their positions.
    pub fn blank(resolution: u32) -> Self {
        Self::from_fn(resolution, |x, y| {
            Cell::new(Vec2::new(x as f32, y as f32), Vec4::ZERO)
        })
    }

    /// Grid tiled with `color_cube_count x color_cube_count` color cubes.
    ///
    /// `color_cube_count` must lie in `1..=resolution`, otherwise the cube
    /// size would be zero.
    pub fn seeded(resolution: u32, color_cube_count: u32) -> SimResult<Self> {
        if color_cube_count == 0 || color_cube_count > resolution {
            return Err(SimError::Config(format!(
                "color_cube_count must be in 1..={}, got {}",
                resolution, color_cube_count
            )));
        }
        let cube_size = (resolution / color_cube_count) as f32;
        Ok(Self::from_fn(resolution, |x, y| {
            let (fx, fy) = (x as f32, y as f32);
            Cell::new(Vec2::new(fx, fy), seed_state(fx, fy, cube_size))
        }))
    }

    pub fn from_fn(resolution: u32, mut f: impl FnMut(u32, u32) -> Cell) -> Self {
        let n = resolution as usize;
        let mut cells = Vec::with_capacity(n * n);
        for x in 0..resolution {
            for y in 0..resolution {
                cells.push(f(x, y));
            }
        }
        Self { resolution, cells }
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index(&self, x: u32, y: u32) -> SimResult<usize> {
        if x >= self.resolution || y >= self.resolution {
            return Err(SimError::OutOfBounds {
                x,
                y,
                resolution: self.resolution,
            });
        }
        Ok(x as usize * self.resolution as usize + y as usize)
    }

    /// Inverse of [`Grid::index`]. Only meaningful for `index < len()`.
    #[inline]
    pub fn coords(&self, index: usize) -> (u32, u32) {
        let n = self.resolution as usize;
        ((index / n) as u32, (index % n) as u32)
    }

    pub fn get(&self, x: u32, y: u32) -> SimResult<Cell> {
        let index = self.index(x, y)?;
        Ok(self.cells[index])
    }

    pub fn set(&mut self, x: u32, y: u32, cell: Cell) -> SimResult<()> {
        let index = self.index(x, y)?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Map a texture coordinate in `[0, 1)` to the cell under it.
    pub fn cell_at_uv(&self, u: f32, v: f32) -> Option<(u32, u32)> {
        let n = self.resolution as f32;
        let (fx, fy) = ((u * n).floor(), (v * n).floor());
        // NaN fails both comparisons and is rejected too.
        if (0.0..n).contains(&fx) && (0.0..n).contains(&fy) {
            Some((fx as u32, fy as u32))
        } else {
            None
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Overwrite this grid's contents with `src`. Sizes must match.
    pub fn copy_from(&mut self, src: &[Cell]) -> SimResult<()> {
        if src.len() != self.cells.len() {
            return Err(SimError::SizeMismatch {
                expected: self.cells.len(),
                actual: src.len(),
            });
        }
        self.cells.copy_from_slice(src);
        Ok(())
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_alive()).count()
    }
}


// --- End of File: grid.rs ---
