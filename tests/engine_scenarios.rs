//! End-to-end behaviour of the stepping engine against a recording device.

use gridstep::{
    Cell, ComputeDevice, CopyRule, CpuDevice, DispatchMode, Grid, RunState, SimError, SimResult,
    SimulationConfig, SimulationEngine, Slot, TickOutcome, TransitionRule,
};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Upload(Slot),
    Dispatch(Slot, Slot, DispatchMode),
    Fetch(Slot),
    Commit(Slot, usize),
}

/// CPU copy device that records every call made on it.
struct RecordingDevice {
    inner: CpuDevice<CopyRule>,
    calls: Vec<Call>,
}

impl RecordingDevice {
    fn new(resolution: u32) -> Self {
        Self {
            inner: CpuDevice::new(resolution, CopyRule),
            calls: Vec::new(),
        }
    }

    fn dispatches(&self) -> Vec<(Slot, Slot, DispatchMode)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Dispatch(src, dst, mode) => Some((*src, *dst, *mode)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|&c| pred(c)).count()
    }
}

impl ComputeDevice for RecordingDevice {
    fn upload(&mut self, slot: Slot, grid: &Grid) -> SimResult<()> {
        self.calls.push(Call::Upload(slot));
        self.inner.upload(slot, grid)
    }

    fn dispatch(&mut self, source: Slot, target: Slot, mode: DispatchMode) -> SimResult<()> {
        self.calls.push(Call::Dispatch(source, target, mode));
        self.inner.dispatch(source, target, mode)
    }

    fn fetch(&mut self, slot: Slot, out: &mut Grid) -> SimResult<()> {
        self.calls.push(Call::Fetch(slot));
        self.inner.fetch(slot, out)
    }

    fn commit(&mut self, slot: Slot, index: usize, cell: Cell) -> SimResult<()> {
        self.calls.push(Call::Commit(slot, index));
        self.inner.commit(slot, index, cell)
    }
}

/// Device whose dispatch always fails.
struct BrokenDevice;

impl ComputeDevice for BrokenDevice {
    fn upload(&mut self, _slot: Slot, _grid: &Grid) -> SimResult<()> {
        Ok(())
    }

    fn dispatch(&mut self, _source: Slot, _target: Slot, _mode: DispatchMode) -> SimResult<()> {
        Err(SimError::Device("out of memory".into()))
    }

    fn fetch(&mut self, _slot: Slot, _out: &mut Grid) -> SimResult<()> {
        Ok(())
    }

    fn commit(&mut self, _slot: Slot, _index: usize, _cell: Cell) -> SimResult<()> {
        Ok(())
    }
}

fn scenario_engine() -> SimulationEngine<RecordingDevice> {
    let config = SimulationConfig::new()
        .with_resolution(4)
        .with_color_cube_count(1)
        .with_speed_limits(1.0, 1.0);
    SimulationEngine::new(config, RecordingDevice::new(4)).unwrap()
}

/// Advancing adds one to the red channel; refreshing copies through.
fn aging_rule(source: &Grid, x: u32, y: u32, mode: DispatchMode) -> Cell {
    let cell = source.get(x, y).unwrap();
    if !mode.is_running() {
        return cell;
    }
    let mut state = cell.state();
    state.x += 1.0;
    Cell::new(cell.position(), state)
}

fn aging_engine() -> SimulationEngine<CpuDevice<impl TransitionRule>> {
    let config = SimulationConfig::new()
        .with_resolution(4)
        .with_color_cube_count(1)
        .with_speed_limits(1.0, 1.0);
    SimulationEngine::new(config, CpuDevice::new(4, aging_rule)).unwrap()
}

fn assert_aged_by(grid: &Grid, base: &Grid, steps: f32) {
    for (cell, seed) in grid.cells().iter().zip(base.cells()) {
        assert_eq!(cell.position(), seed.position());
        assert_eq!(cell.state().x, seed.state().x + steps);
        assert_eq!(cell.state().y, seed.state().y);
        assert_eq!(cell.state().z, seed.state().z);
    }
}

#[test]
fn both_slots_uploaded_with_seed_pattern() {
    let mut engine = scenario_engine();
    assert_eq!(
        engine.device().calls,
        vec![Call::Upload(Slot::Front), Call::Upload(Slot::Back)]
    );
    let seeded = Grid::seeded(4, 1).unwrap();
    assert_eq!(engine.buffers().readable(), &seeded);
    assert_eq!(engine.buffers().writable(), &seeded);
    assert_eq!(engine.readable_grid().unwrap(), &seeded);
}

#[test]
fn running_steps_after_accumulating_one_interval() {
    let mut engine = scenario_engine();
    assert_eq!(engine.interval(), 1.0);
    engine.run_stop();

    assert_eq!(engine.on_tick(0.4).unwrap(), TickOutcome::Idle);
    assert_eq!(engine.on_tick(0.4).unwrap(), TickOutcome::Idle);
    assert_eq!(engine.on_tick(0.4).unwrap(), TickOutcome::Stepped);
    assert_eq!(engine.elapsed(), 0.0);
    assert_eq!(engine.steps_completed(), 1);
    assert_eq!(
        engine.device().dispatches(),
        vec![(Slot::Front, Slot::Back, DispatchMode::Advance)]
    );
    assert_eq!(engine.buffers().readable_slot(), Slot::Back);
}

#[test]
fn long_tick_steps_once_and_drops_remainder() {
    let mut engine = scenario_engine();
    engine.run_stop();
    assert_eq!(engine.on_tick(1.5).unwrap(), TickOutcome::Stepped);
    assert_eq!(engine.elapsed(), 0.0);
    assert_eq!(engine.on_tick(0.6).unwrap(), TickOutcome::Idle);
    assert_eq!(engine.steps_completed(), 1);
}

#[test]
fn steps_alternate_buffer_roles() {
    let mut engine = scenario_engine();
    engine.run_stop();
    for _ in 0..4 {
        engine.on_tick(1.0).unwrap();
    }
    assert_eq!(
        engine.device().dispatches(),
        vec![
            (Slot::Front, Slot::Back, DispatchMode::Advance),
            (Slot::Back, Slot::Front, DispatchMode::Advance),
            (Slot::Front, Slot::Back, DispatchMode::Advance),
            (Slot::Back, Slot::Front, DispatchMode::Advance),
        ]
    );
    assert_eq!(engine.buffers().readable_slot(), Slot::Front);
}

#[test]
fn paused_ticks_always_refresh() {
    let mut engine = scenario_engine();
    assert_eq!(engine.on_tick(0.0).unwrap(), TickOutcome::Refreshed);
    assert_eq!(engine.on_tick(0.01).unwrap(), TickOutcome::Refreshed);
    assert_eq!(engine.on_tick(5.0).unwrap(), TickOutcome::Refreshed);
    assert_eq!(
        engine.device().dispatches(),
        vec![(Slot::Front, Slot::Back, DispatchMode::Refresh); 3]
    );
    assert_eq!(engine.steps_completed(), 0);
    assert_eq!(engine.buffers().readable_slot(), Slot::Front);
    assert_eq!(engine.elapsed(), 0.0);
}

#[test]
fn single_step_runs_exactly_one_step() {
    let mut engine = scenario_engine();
    engine.single_step();
    assert_eq!(engine.run_state(), RunState::Running);

    // Rides the normal timed path: nothing until the interval is reached.
    assert_eq!(engine.on_tick(0.5).unwrap(), TickOutcome::Idle);
    engine.single_step();
    assert_eq!(engine.on_tick(0.5).unwrap(), TickOutcome::Stepped);
    assert_eq!(engine.run_state(), RunState::Paused);

    assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Refreshed);
    assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Refreshed);
    assert_eq!(engine.steps_completed(), 1);
    let advances = engine
        .device()
        .count(|c| matches!(c, Call::Dispatch(_, _, DispatchMode::Advance)));
    assert_eq!(advances, 1);
    assert_eq!(engine.buffers().readable_slot(), Slot::Back);
}

#[test]
fn run_stop_halts_further_steps() {
    let mut engine = scenario_engine();
    engine.run_stop();
    engine.on_tick(1.0).unwrap();
    engine.run_stop();
    assert_eq!(engine.run_state(), RunState::Paused);
    for _ in 0..5 {
        assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Refreshed);
    }
    assert_eq!(engine.steps_completed(), 1);
}

#[test]
fn toggle_fetches_stale_readable_then_commits_one_cell() {
    let mut engine = scenario_engine();
    engine.run_stop();
    engine.on_tick(1.0).unwrap();
    engine.run_stop();

    let before = engine.device().calls.len();
    let cell = engine.toggle(1, 2).unwrap();
    assert!(cell.is_alive());
    assert_eq!(
        engine.device().calls[before..],
        [Call::Fetch(Slot::Back), Call::Commit(Slot::Back, 6)]
    );

    // Mirror is current now, so a second toggle skips the fetch.
    let before = engine.device().calls.len();
    let cell = engine.toggle(1, 2).unwrap();
    assert!(!cell.is_alive());
    assert_eq!(
        engine.device().calls[before..],
        [Call::Commit(Slot::Back, 6)]
    );
}

#[test]
fn toggle_shows_up_after_refresh_and_survives_copy_step() {
    let mut engine = scenario_engine();
    engine.toggle(3, 0).unwrap();
    assert_eq!(engine.on_tick(0.0).unwrap(), TickOutcome::Refreshed);

    engine.single_step();
    engine.on_tick(1.0).unwrap();
    let grid = engine.readable_grid().unwrap();
    assert!(grid.get(3, 0).unwrap().is_alive());
    assert_eq!(grid.alive_count(), 1);
}

#[test]
fn steps_apply_the_rule_to_readable_contents() {
    let mut engine = aging_engine();
    let base = engine.readable_grid().unwrap().clone();

    for _ in 0..3 {
        assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Refreshed);
    }
    assert_eq!(engine.readable_grid().unwrap(), &base);

    engine.run_stop();
    for k in 1..=5 {
        assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Stepped);
        assert_aged_by(engine.readable_grid().unwrap(), &base, k as f32);
    }
    assert_eq!(engine.buffers().readable_slot(), Slot::Back);

    engine.run_stop();
    for _ in 0..2 {
        assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Refreshed);
    }
    assert_aged_by(engine.readable_grid().unwrap(), &base, 5.0);
}

#[test]
fn toggled_cell_is_carried_through_a_step() {
    let mut engine = aging_engine();
    let base = engine.readable_grid().unwrap().clone();
    engine.run_stop();
    engine.on_tick(1.0).unwrap();
    engine.on_tick(1.0).unwrap();
    engine.run_stop();

    let toggled = engine.toggle(2, 1).unwrap();
    assert!(toggled.is_alive());
    assert_eq!(toggled.state().x, base.get(2, 1).unwrap().state().x + 2.0);

    engine.single_step();
    assert_eq!(engine.on_tick(1.0).unwrap(), TickOutcome::Stepped);
    assert_eq!(engine.run_state(), RunState::Paused);

    let grid = engine.readable_grid().unwrap();
    assert_aged_by(grid, &base, 3.0);
    assert!(grid.get(2, 1).unwrap().is_alive());
    assert_eq!(grid.alive_count(), 1);

    // The pre-step grid keeps the toggle at its old age.
    let previous = engine.device().slot(engine.buffers().writable_slot());
    assert_aged_by(previous, &base, 2.0);
    assert!(previous.get(2, 1).unwrap().is_alive());
}

#[test]
fn toggle_while_running_is_an_error() {
    let mut engine = scenario_engine();
    engine.single_step();
    assert!(matches!(
        engine.toggle(0, 0),
        Err(SimError::InvalidState(_))
    ));
    let commits = engine.device().count(|c| matches!(c, Call::Commit(..)));
    assert_eq!(commits, 0);
}

#[test]
fn dispatch_failure_surfaces_and_does_not_swap() {
    let config = SimulationConfig::new().with_resolution(2);
    let mut engine = SimulationEngine::new(config, BrokenDevice).unwrap();
    engine.run_stop();
    let err = engine.on_tick(10.0).unwrap_err();
    assert!(matches!(err, SimError::Device(_)));
    assert_eq!(engine.steps_completed(), 0);
    assert_eq!(engine.buffers().readable_slot(), Slot::Front);
}

proptest! {
    #[test]
    fn double_toggle_restores_cell(x in 0u32..4, y in 0u32..4, steps in 0usize..4) {
        let mut engine = scenario_engine();
        engine.run_stop();
        for _ in 0..steps {
            engine.on_tick(1.0).unwrap();
        }
        engine.run_stop();

        let writable_slot = engine.buffers().writable_slot();
        let writable_before = engine.device().inner.slot(writable_slot).clone();
        let original = engine.readable_grid().unwrap().get(x, y).unwrap();
        let once = engine.toggle(x, y).unwrap();
        prop_assert_eq!(once.position, original.position);
        prop_assert_eq!(&once.state[..3], &original.state[..3]);
        prop_assert_ne!(once.is_alive(), original.is_alive());

        let twice = engine.toggle(x, y).unwrap();
        prop_assert_eq!(twice, original);

        prop_assert_eq!(engine.device().inner.slot(writable_slot), &writable_before);
    }

    #[test]
    fn readable_and_writable_differ_across_steps(ticks in proptest::collection::vec(0.0f32..2.0, 0..40)) {
        let mut engine = scenario_engine();
        engine.run_stop();
        let mut expected_steps = 0;
        for dt in ticks {
            if engine.on_tick(dt).unwrap() == TickOutcome::Stepped {
                expected_steps += 1;
            }
            prop_assert_ne!(engine.buffers().readable_slot(), engine.buffers().writable_slot());
        }
        prop_assert_eq!(engine.steps_completed(), expected_steps);
        let expected_slot = if expected_steps % 2 == 0 { Slot::Front } else { Slot::Back };
        prop_assert_eq!(engine.buffers().readable_slot(), expected_slot);
    }
}
