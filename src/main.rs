// --- File: main.rs ---
use gridstep::constants::*;
use gridstep::gpu::LIFE_KERNEL;
use gridstep::{
    Cell, ComputeDevice, CpuDevice, DispatchMode, GpuDevice, Grid, RunState, SimResult,
    SimulationConfig, SimulationEngine, TickOutcome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

// --- Demo Constants ---
const INITIAL_LIVE_CELLS: usize = 600;
const DEMO_DURATION_SECS: f32 = 10.0;

// Same rule as shaders/life.wgsl, for the CPU device.
fn life_rule(source: &Grid, x: u32, y: u32, mode: DispatchMode) -> Cell {
    let n = source.resolution();
    let cells = source.cells();
    let cell = cells[x as usize * n as usize + y as usize];
    if !mode.is_running() {
        return cell;
    }
    let mut neighbours = 0;
    for dx in [n - 1, 0, 1] {
        for dy in [n - 1, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = (x + dx) % n;
            let ny = (y + dy) % n;
            if cells[nx as usize * n as usize + ny as usize].is_alive() {
                neighbours += 1;
            }
        }
    }
    cell.with_alive(neighbours == 3 || (cell.is_alive() && neighbours == 2))
}

fn run<D: ComputeDevice>(mut engine: SimulationEngine<D>) -> SimResult<()> {
    let n = engine.config().resolution;
    let mut rng = StdRng::from_entropy();
    for _ in 0..INITIAL_LIVE_CELLS {
        let (x, y) = (rng.gen_range(0..n), rng.gen_range(0..n));
        engine.toggle(x, y)?;
    }
    engine.on_tick(0.0)?;
    log::info!(
        "Seeded {} live cells",
        engine.readable_grid()?.alive_count()
    );

    // One explicit step before free running.
    engine.single_step();
    while engine.run_state() == RunState::Running {
        engine.on_tick(FIXED_TIMESTEP)?;
    }
    log::info!(
        "After single step: {} live cells",
        engine.readable_grid()?.alive_count()
    );

    engine.set_speed(1.0)?;
    engine.run_stop();

    let started = Instant::now();
    let mut last_stats_time = Instant::now();
    let mut steps_since_last_stats = 0u32;
    let mut sim_time = 0.0;
    while sim_time < DEMO_DURATION_SECS {
        if engine.on_tick(FIXED_TIMESTEP)? == TickOutcome::Stepped {
            steps_since_last_stats += 1;
        }
        sim_time += FIXED_TIMESTEP;

        let elapsed_secs = last_stats_time.elapsed().as_secs_f64();
        if elapsed_secs >= STATS_UPDATE_INTERVAL_SECS {
            log::info!(
                "Step {} - {} live - {:.1} steps/s",
                engine.steps_completed(),
                engine.readable_grid()?.alive_count(),
                steps_since_last_stats as f64 / elapsed_secs
            );
            last_stats_time = Instant::now();
            steps_since_last_stats = 0;
        }
    }
    engine.run_stop();

    println!(
        "Ran {} steps over {:.1}s simulated ({:.2}s wall), {} live cells",
        engine.steps_completed(),
        sim_time,
        started.elapsed().as_secs_f64(),
        engine.readable_grid()?.alive_count()
    );
    Ok(())
}

// --- Main Function ---
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let use_gpu = std::env::args().skip(1).any(|arg| arg == "--gpu");
    let config = SimulationConfig::new();
    let resolution = config.resolution;

    if use_gpu {
        let device = GpuDevice::new(resolution, LIFE_KERNEL)?;
        run(SimulationEngine::new(config, device)?)?;
    } else {
        let device = CpuDevice::new(resolution, life_rule);
        run(SimulationEngine::new(config, device)?)?;
    }
    Ok(())
}

// --- End of File: main.rs ---
