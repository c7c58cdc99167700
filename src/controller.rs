// --- File: controller.rs ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Paused,
    Running,
}

/// Run/pause state machine with a one-shot "stop after the next step" latch.
/// The latch is only ever set while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunController {
    state: RunState,
    stop_after_next: bool,
}

impl Default for RunController {
    fn default() -> Self {
        Self {
            state: RunState::Paused,
            stop_after_next: false,
        }
    }
}

impl RunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_stop(&mut self) {
        self.state = match self.state {
            RunState::Paused => RunState::Running,
            RunState::Running => RunState::Paused,
        };
        self.stop_after_next = false;
        log::info!(
            "Simulation {}",
            if self.is_running() { "Resumed" } else { "Paused" }
        );
    }

    /// Run for exactly one more step, then pause. Calling it again before
    /// that step fires does not queue a second one.
    pub fn single_step(&mut self) {
        if self.state == RunState::Paused {
            log::info!("Single step queued");
        }
        self.state = RunState::Running;
        self.stop_after_next = true;
    }

    /// Hook run after every fired tick.
    pub fn after_step(&mut self) {
        if self.stop_after_next {
            self.state = RunState::Paused;
            self.stop_after_next = false;
            log::info!("Simulation Paused after single step");
        }
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    #[inline]
    pub fn stop_after_next(&self) -> bool {
        self.stop_after_next
    }
}


// --- End of File: controller.rs ---
