// --- File: buffer.rs ---
// Ping-pong pair of grids.
//
// The device holds the authoritative cell data; the grids kept here are
// host-side mirrors. Each mirror carries a "current" bit that is cleared
// whenever the device writes the matching slot, so readers know when a
// fetch is required.

use crate::error::{SimError, SimResult};
use crate::grid::Grid;

/// One member of the buffer pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Front,
    Back,
}

impl Slot {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::Front => 0,
            Slot::Back => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Slot {
        match self {
            Slot::Front => Slot::Back,
            Slot::Back => Slot::Front,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    grids: [Grid; 2],
    current: [bool; 2],
    source: Slot,
    // Set by `begin_step`, consumed by `swap`.
    step_armed: bool,
}

impl DoubleBuffer {
    /// Both slots start as copies of `initial`.
    pub fn new(initial: Grid) -> Self {
        Self {
            grids: [initial.clone(), initial],
            current: [true; 2],
            source: Slot::Front,
            step_armed: false,
        }
    }

    #[inline]
    pub fn readable_slot(&self) -> Slot {
        self.source
    }

    #[inline]
    pub fn writable_slot(&self) -> Slot {
        self.source.other()
    }

    #[inline]
    pub fn readable(&self) -> &Grid {
        &self.grids[self.source.index()]
    }

    #[inline]
    pub fn writable(&self) -> &Grid {
        &self.grids[self.writable_slot().index()]
    }

    #[inline]
    pub fn readable_mut(&mut self) -> &mut Grid {
        &mut self.grids[self.source.index()]
    }

    #[inline]
    pub fn grid(&self, slot: Slot) -> &Grid {
        &self.grids[slot.index()]
    }

    #[inline]
    pub fn grid_mut(&mut self, slot: Slot) -> &mut Grid {
        &mut self.grids[slot.index()]
    }

    pub fn resolution(&self) -> u32 {
        self.grids[0].resolution()
    }

    /// Arm a step and return `(source, target)`. The next `swap` is only
    /// accepted after this.
    pub fn begin_step(&mut self) -> (Slot, Slot) {
        self.step_armed = true;
        (self.readable_slot(), self.writable_slot())
    }

    pub fn swap(&mut self) -> SimResult<()> {
        if !self.step_armed {
            return Err(SimError::UnpairedSwap);
        }
        self.step_armed = false;
        self.source = self.source.other();
        Ok(())
    }

    #[inline]
    pub fn is_current(&self, slot: Slot) -> bool {
        self.current[slot.index()]
    }

    #[inline]
    pub fn invalidate(&mut self, slot: Slot) {
        self.current[slot.index()] = false;
    }

    #[inline]
    pub fn mark_current(&mut self, slot: Slot) {
        self.current[slot.index()] = true;
    }

    /// Put both slots back to `initial`, front readable.
    pub fn reset(&mut self, initial: Grid) {
        *self = Self::new(initial);
    }
}


// --- End of File: buffer.rs ---
