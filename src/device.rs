// --- File: device.rs ---
// Compute device seam.
//
// Cell data lives on a device; the host only sees it through `fetch`
// and only changes it through `commit`.

use crate::buffer::Slot;
use crate::error::{SimError, SimResult};
use crate::grid::{Cell, Grid};
use rayon::prelude::*;

/// What a dispatch is for. Mirrors the kernel's `running` uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DispatchMode {
    /// Paused redraw: the kernel must not advance the automaton.
    Refresh,
    /// A real simulation step.
    Advance,
}

impl DispatchMode {
    #[inline]
    pub fn is_running(self) -> bool {
        self == DispatchMode::Advance
    }
}

pub trait ComputeDevice {
    /// Replace the contents of `slot` with `grid`.
    fn upload(&mut self, slot: Slot, grid: &Grid) -> SimResult<()>;

    /// Run the transition kernel over every cell, reading `source` and
    /// writing `target`. May return before the work completes.
    fn dispatch(&mut self, source: Slot, target: Slot, mode: DispatchMode) -> SimResult<()>;

    /// Copy the device contents of `slot` into `out`, waiting for any
    /// pending dispatch first.
    fn fetch(&mut self, slot: Slot, out: &mut Grid) -> SimResult<()>;

    /// Write a single cell back to `slot`.
    fn commit(&mut self, slot: Slot, index: usize, cell: Cell) -> SimResult<()>;
}

/// Per-cell transition function. Must be deterministic in
/// `(source, x, y, mode)`.
pub trait TransitionRule: Send + Sync {
    fn next(&self, source: &Grid, x: u32, y: u32, mode: DispatchMode) -> Cell;
}

impl<F> TransitionRule for F
where
    F: Fn(&Grid, u32, u32, DispatchMode) -> Cell + Send + Sync,
{
    fn next(&self, source: &Grid, x: u32, y: u32, mode: DispatchMode) -> Cell {
        self(source, x, y, mode)
    }
}

/// Target becomes an exact copy of the source.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyRule;

impl TransitionRule for CopyRule {
    fn next(&self, source: &Grid, x: u32, y: u32, _mode: DispatchMode) -> Cell {
        let index = x as usize * source.resolution() as usize + y as usize;
        source.cells()[index]
    }
}

/// Host-memory device that runs the rule across a rayon thread pool.
/// Dispatch completes before returning, so `fetch` never waits.
pub struct CpuDevice<R> {
    rule: R,
    slots: [Grid; 2],
    dispatches: u64,
}

impl<R: TransitionRule> CpuDevice<R> {
    pub fn new(resolution: u32, rule: R) -> Self {
        Self {
            rule,
            slots: [Grid::blank(resolution), Grid::blank(resolution)],
            dispatches: 0,
        }
    }

    /// Number of kernel dispatches executed so far.
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub fn slot(&self, slot: Slot) -> &Grid {
        &self.slots[slot.index()]
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }
}

impl<R: TransitionRule> ComputeDevice for CpuDevice<R> {
    fn upload(&mut self, slot: Slot, grid: &Grid) -> SimResult<()> {
        self.slots[slot.index()].copy_from(grid.cells())
    }

    fn dispatch(&mut self, source: Slot, target: Slot, mode: DispatchMode) -> SimResult<()> {
        if source == target {
            return Err(SimError::Device(
                "dispatch source and target must differ".into(),
            ));
        }
        let [front, back] = &mut self.slots;
        let (src, dst) = match source {
            Slot::Front => (&*front, back),
            Slot::Back => (&*back, front),
        };
        if src.len() != dst.len() {
            return Err(SimError::SizeMismatch {
                expected: src.len(),
                actual: dst.len(),
            });
        }

        let rule = &self.rule;
        let n = src.resolution() as usize;
        dst.cells_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, cell)| {
                *cell = rule.next(src, (i / n) as u32, (i % n) as u32, mode);
            });

        self.dispatches += 1;
        log::debug!("cpu dispatch #{} {:?} {:?} -> {:?}", self.dispatches, mode, source, target);
        Ok(())
    }

    fn fetch(&mut self, slot: Slot, out: &mut Grid) -> SimResult<()> {
        out.copy_from(self.slots[slot.index()].cells())
    }

    fn commit(&mut self, slot: Slot, index: usize, cell: Cell) -> SimResult<()> {
        let grid = &mut self.slots[slot.index()];
        if index >= grid.len() {
            let (x, y) = grid.coords(index);
            return Err(SimError::OutOfBounds {
                x,
                y,
                resolution: grid.resolution(),
            });
        }
        grid.cells_mut()[index] = cell;
        Ok(())
    }
}


// --- End of File: device.rs ---
