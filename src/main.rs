//! pedsim entry point
//!
//! Batch runs, door-width sweeps, initial layout generation and default
//! configuration output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use pedsim::{BenchmarkConfig, Config};
use pedsim::generate::{grid_layout, write_positions};
use pedsim::runner::{self, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "pedsim")]
#[command(about = "Room evacuation with contractile pedestrians")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an evacuation and write trajectory and benchmark files
    Run {
        /// Configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// RNG seed, overrides the configuration
        #[arg(short, long)]
        seed: Option<u64>,

        /// Give up after this many steps
        #[arg(long = "max-steps")]
        max_steps: Option<u64>,
    },

    /// Sweep the configured door widths over several generated crowds each
    Bench {
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Seed for the whole sweep
        #[arg(short, long)]
        seed: Option<u64>,

        /// Give up on a round after this many steps
        #[arg(long = "max-steps")]
        max_steps: Option<u64>,
    },

    /// Write a random initial layout to the configured input file
    Generate {
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Write the default configuration
    Init {
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match execute(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> pedsim::Result<()> {
    match command {
        Command::Run {
            config,
            seed,
            max_steps,
        } => {
            let config = Config::load(&config)?;
            let summary = runner::run(&config, RunOptions { seed, max_steps })?;
            println!(
                "{} of {} pedestrians out after {:.3}s ({} steps, seed {})",
                summary.exited, summary.pedestrians, summary.time, summary.steps, summary.seed
            );
            println!(
                "flow {:.4} +/- {:.4} per step, {:.3} per second, {} collisions",
                summary.flow.mean,
                summary.flow.std_dev,
                summary.flow.rate_per_second(summary.dt),
                summary.collisions
            );
        }
        Command::Bench {
            config,
            seed,
            max_steps,
        } => {
            let config = Config::load(&config)?;
            let entries = runner::sweep(&config, RunOptions { seed, max_steps })?;
            println!("door  pedestrians  exits/step  std_dev  per_second");
            for entry in entries {
                let dt = entry.runs.first().map_or(0.0, |r| r.dt);
                println!(
                    "{:<5} {:<12} {:<11.4} {:<8.4} {:.3}",
                    entry.exit_width,
                    entry.pedestrians,
                    entry.flow.mean,
                    entry.flow.std_dev,
                    entry.flow.rate_per_second(dt)
                );
            }
        }
        Command::Generate { config, seed } => {
            let config = Config::load(&config)?;
            let seed = runner::resolve_seed(&config, &RunOptions { seed, max_steps: None });
            let mut rng = Pcg32::seed_from_u64(seed);
            let positions = grid_layout(&config.simulation, &mut rng)?;
            write_positions(&config.files.static_input, &positions)?;
        }
        Command::Init { config: path } => {
            let config = Config {
                benchmarks: Some(BenchmarkConfig::default()),
                ..Default::default()
            };
            config.save(&path)?;
        }
    }
    Ok(())
}
