//! Batch evacuation runs
//!
//! A single run reads the initial crowd, steps the simulation until the room
//! is empty and writes the trajectory and benchmark files along the way. A
//! sweep repeats that over freshly generated crowds for every door width in
//! the `benchmarks` section.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::generate::{grid_layout, write_positions};
use crate::input::{read_positions, spawn_particles};
use crate::output::{BenchmarkWriter, TrajectoryWriter};
use crate::sim::Simulation;
use crate::stats::FlowStats;

/// Command-line overrides for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Takes precedence over the configured seed
    pub seed: Option<u64>,
    /// Stop after this many steps even if pedestrians remain
    pub max_steps: Option<u64>,
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub seed: u64,
    pub pedestrians: usize,
    pub steps: u64,
    /// Simulated time at the end of the run (seconds)
    pub time: f64,
    pub dt: f64,
    pub exited: u64,
    pub collisions: u64,
    pub frames: u64,
    pub flow: FlowStats,
    /// Pedestrians still inside when `max_steps` cut the run short
    pub remaining: usize,
}

impl RunSummary {
    pub fn truncated(&self) -> bool {
        self.remaining > 0
    }
}

/// Seed for the run: the override, else the configured one, else a fresh one
pub fn resolve_seed(config: &Config, options: &RunOptions) -> u64 {
    match options.seed.or(config.simulation.seed) {
        Some(seed) => seed,
        None => {
            let seed = rand::rng().random();
            log::info!("No seed configured, using {seed}");
            seed
        }
    }
}

/// Run one evacuation to completion
pub fn run(config: &Config, options: RunOptions) -> Result<RunSummary> {
    run_with_series(config, options).map(|(summary, _)| summary)
}

/// Run one evacuation, also returning the cumulative exit count after each
/// step
pub fn run_with_series(config: &Config, options: RunOptions) -> Result<(RunSummary, Vec<u64>)> {
    config.validate()?;
    let cfg = &config.simulation;
    let files = &config.files;
    let seed = resolve_seed(config, &options);

    let positions = read_positions(&files.static_input)?;
    let particles = spawn_particles(&positions, cfg);
    let pedestrians = particles.len();

    let mut sim = Simulation::new(cfg.clone(), particles, seed)?;
    let mut trajectory = TrajectoryWriter::create(&files.output)?;
    let mut benchmark = BenchmarkWriter::create(&files.benchmark)?;

    log::info!(
        "Evacuating {} pedestrians from a {}x{} room (door {}), seed {}",
        pedestrians,
        cfg.box_length,
        cfg.box_length,
        cfg.exit_width,
        seed
    );

    let mut cumulative = Vec::new();
    while !sim.is_done() {
        if options.max_steps.is_some_and(|max| sim.steps() >= max) {
            log::warn!(
                "Stopped after {} steps with {} pedestrians still inside",
                sim.steps(),
                sim.particles().len()
            );
            break;
        }

        let index = sim.steps();
        sim.step()?;

        if index % cfg.output_interval == 0 {
            trajectory.write_frame(sim.time(), sim.particles())?;
            log::debug!(
                "t={:.3}: {} inside, {} exited",
                sim.time(),
                sim.particles().len(),
                sim.exited()
            );
        }
        benchmark.write_step(sim.time(), sim.exited())?;
        cumulative.push(sim.exited());
    }

    let frames = trajectory.frames();
    trajectory.finish()?;
    benchmark.finish()?;

    let summary = RunSummary {
        seed,
        pedestrians,
        steps: sim.steps(),
        time: sim.time(),
        dt: sim.dt(),
        exited: sim.exited(),
        collisions: sim.collisions(),
        frames,
        flow: FlowStats::from_cumulative(&cumulative),
        remaining: sim.particles().len(),
    };
    log::info!(
        "Finished at t={:.3} after {} steps: {}/{} exited, {} collisions, flow {:.3}/s",
        summary.time,
        summary.steps,
        summary.exited,
        summary.pedestrians,
        summary.collisions,
        summary.flow.rate_per_second(summary.dt)
    );
    Ok((summary, cumulative))
}

/// Outcome of one door width in a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    pub exit_width: f64,
    pub pedestrians: usize,
    /// One summary per round, in order
    pub runs: Vec<RunSummary>,
    /// Exits per step pooled over every round
    pub flow: FlowStats,
}

/// Door-width sweep over the configured `benchmarks` section
///
/// Every round writes a new layout to the input file, then runs it; the
/// output files are overwritten each round. Layout and run seeds are drawn
/// from one generator seeded like a single run, so a fixed seed reproduces
/// the whole sweep.
pub fn sweep(config: &Config, options: RunOptions) -> Result<Vec<SweepEntry>> {
    config.validate()?;
    let benchmarks = config
        .benchmarks
        .as_ref()
        .ok_or_else(|| Error::Config("no benchmarks section to sweep".into()))?;

    let base = resolve_seed(config, &options);
    let mut seeds = Pcg32::seed_from_u64(base);
    let mut entries = Vec::with_capacity(benchmarks.exit_widths.len());

    for (exit_width, pedestrians) in benchmarks.cases() {
        let mut case = config.clone();
        case.simulation.exit_width = exit_width;
        case.simulation.pedestrians = pedestrians;
        case.benchmarks = None;
        log::info!(
            "Sweep: door {exit_width}, {pedestrians} pedestrians, {} rounds",
            benchmarks.rounds
        );

        let mut runs = Vec::with_capacity(benchmarks.rounds);
        let mut series = Vec::with_capacity(benchmarks.rounds);
        for round in 0..benchmarks.rounds {
            let layout_seed: u64 = seeds.random();
            let run_seed: u64 = seeds.random();

            let mut layout_rng = Pcg32::seed_from_u64(layout_seed);
            let positions = grid_layout(&case.simulation, &mut layout_rng)?;
            write_positions(&case.files.static_input, &positions)?;

            let round_options = RunOptions {
                seed: Some(run_seed),
                max_steps: options.max_steps,
            };
            let (summary, cumulative) = run_with_series(&case, round_options)?;
            log::debug!(
                "Round {} of door {}: {} steps, {} exited",
                round + 1,
                exit_width,
                summary.steps,
                summary.exited
            );
            runs.push(summary);
            series.push(cumulative);
        }

        let flow = FlowStats::pooled(series.iter().map(Vec::as_slice));
        log::info!(
            "Door {exit_width}: {:.4} +/- {:.4} exits per step",
            flow.mean,
            flow.std_dev
        );
        entries.push(SweepEntry {
            exit_width,
            pedestrians,
            runs,
            flow,
        });
    }
    Ok(entries)
}
