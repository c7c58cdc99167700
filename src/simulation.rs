// --- File: simulation.rs ---
use crate::buffer::{DoubleBuffer, Slot};
use crate::config::SimulationConfig;
use crate::constants::INITIAL_SPEED;
use crate::controller::{RunController, RunState};
use crate::device::{ComputeDevice, DispatchMode};
use crate::error::{SimError, SimResult};
use crate::grid::{Cell, Grid};
use crate::scheduler::StepScheduler;

/// What a call to [`SimulationEngine::on_tick`] did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Running, but the step interval has not elapsed yet.
    Idle,
    /// Paused: the kernel was re-dispatched for display without advancing.
    Refreshed,
    /// One simulation step was executed and the buffers swapped.
    Stepped,
}

pub struct SimulationEngine<D> {
    config: SimulationConfig,
    device: D,
    buffers: DoubleBuffer,
    scheduler: StepScheduler,
    controller: RunController,
    speed: f32,
    steps_completed: u64,
}

impl<D: ComputeDevice> SimulationEngine<D> {
    pub fn new(config: SimulationConfig, device: D) -> SimResult<Self> {
        config.validate()?;
        let interval = config.speed_limits.interval_for_speed(INITIAL_SPEED);
        let initial = Grid::seeded(config.resolution, config.color_cube_count)?;
        let mut engine = Self {
            config,
            device,
            buffers: DoubleBuffer::new(initial.clone()),
            scheduler: StepScheduler::new(interval),
            controller: RunController::new(),
            speed: INITIAL_SPEED,
            steps_completed: 0,
        };
        engine.device.upload(Slot::Front, &initial)?;
        engine.device.upload(Slot::Back, &initial)?;
        log::info!(
            "Simulation created: {}x{} grid, {} color cube(s), {:.3}s per step",
            engine.config.resolution,
            engine.config.resolution,
            engine.config.color_cube_count,
            interval
        );
        Ok(engine)
    }

    /// Advance the clock by `delta_time` seconds.
    ///
    /// While paused every tick re-dispatches the kernel in refresh mode so
    /// the displayed buffer reflects the latest toggles. While running the
    /// kernel only fires once a full step interval has accumulated.
    pub fn on_tick(&mut self, delta_time: f32) -> SimResult<TickOutcome> {
        let running = self.controller.is_running();
        let due = self.scheduler.tick(delta_time);
        if running && !due {
            return Ok(TickOutcome::Idle);
        }
        self.scheduler.reset();

        let outcome = if running {
            let (source, target) = self.buffers.begin_step();
            self.device.dispatch(source, target, DispatchMode::Advance)?;
            self.buffers.invalidate(target);
            self.buffers.swap()?;
            self.steps_completed += 1;
            TickOutcome::Stepped
        } else {
            let (source, target) = (self.buffers.readable_slot(), self.buffers.writable_slot());
            self.device.dispatch(source, target, DispatchMode::Refresh)?;
            self.buffers.invalidate(target);
            TickOutcome::Refreshed
        };

        self.controller.after_step();
        Ok(outcome)
    }

    /// Flip the alive flag of one cell in the readable grid.
    ///
    /// Only allowed while paused, which guarantees no step is in flight.
    pub fn toggle(&mut self, x: u32, y: u32) -> SimResult<Cell> {
        if self.controller.is_running() {
            return Err(SimError::InvalidState("cells can only be toggled while paused"));
        }
        let index = self.buffers.readable().index(x, y)?;
        let slot = self.buffers.readable_slot();
        self.sync(slot)?;

        let cell = self.buffers.readable().cells()[index].toggled();
        self.buffers.readable_mut().cells_mut()[index] = cell;
        self.device.commit(slot, index, cell)?;
        log::debug!("Toggled ({x}, {y}) -> alive={}", cell.is_alive());
        Ok(cell)
    }

    /// Toggle the cell under a texture coordinate, ignoring points that
    /// fall outside the grid.
    pub fn toggle_at_uv(&mut self, u: f32, v: f32) -> SimResult<Option<Cell>> {
        match self.buffers.readable().cell_at_uv(u, v) {
            Some((x, y)) => self.toggle(x, y).map(Some),
            None => {
                log::warn!("Ignoring toggle outside the grid at uv ({u}, {v})");
                Ok(None)
            }
        }
    }

    /// Host view of the readable grid, fetched from the device if stale.
    pub fn readable_grid(&mut self) -> SimResult<&Grid> {
        let slot = self.buffers.readable_slot();
        self.sync(slot)?;
        Ok(self.buffers.readable())
    }

    fn sync(&mut self, slot: Slot) -> SimResult<()> {
        if !self.buffers.is_current(slot) {
            self.device.fetch(slot, self.buffers.grid_mut(slot))?;
            self.buffers.mark_current(slot);
        }
        Ok(())
    }

    pub fn run_stop(&mut self) {
        self.controller.run_stop();
    }

    pub fn single_step(&mut self) {
        self.controller.single_step();
    }

    /// Set the speed slider. `0.0` is the slowest configured rate, `1.0`
    /// the fastest.
    pub fn set_speed(&mut self, speed: f32) -> SimResult<()> {
        if !(0.0..=1.0).contains(&speed) {
            return Err(SimError::Config(format!(
                "speed must be within [0, 1], got {speed}"
            )));
        }
        let interval = self.config.speed_limits.interval_for_speed(speed);
        self.scheduler.configure(interval);
        self.speed = speed;
        log::info!("Speed: {:.2} ({:.3}s per step)", speed, interval);
        Ok(())
    }

    /// Reseed both grids, pause, and restore the initial speed.
    pub fn reset(&mut self) -> SimResult<()> {
        log::info!("Resetting simulation...");
        let initial = Grid::seeded(self.config.resolution, self.config.color_cube_count)?;
        self.device.upload(Slot::Front, &initial)?;
        self.device.upload(Slot::Back, &initial)?;
        self.buffers.reset(initial);
        self.controller = RunController::new();
        self.scheduler = StepScheduler::new(
            self.config.speed_limits.interval_for_speed(INITIAL_SPEED),
        );
        self.speed = INITIAL_SPEED;
        self.steps_completed = 0;
        Ok(())
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        self.controller.state()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn interval(&self) -> f32 {
        self.scheduler.interval()
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.scheduler.elapsed()
    }

    #[inline]
    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Raw buffer pair. Host mirrors may lag the device; prefer
    /// [`SimulationEngine::readable_grid`] for reads.
    #[inline]
    pub fn buffers(&self) -> &DoubleBuffer {
        &self.buffers
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }
}


// --- End of File: simulation.rs ---
