//! Run configuration
//!
//! Loaded once from a JSON file before the run starts, validated, then passed
//! by reference into the index, the particle rules and the stepper. Nothing
//! reads it through global state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::{CellIndex, Room};

/// Physical and numerical parameters of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    // === Room ===
    /// Side of the square room
    pub box_length: f64,
    /// Width of the single door, centered on the bottom wall
    pub exit_width: f64,
    /// Pedestrians to place when generating an initial layout
    pub pedestrians: usize,

    // === Pedestrians ===
    /// Radius of a fully compressed pedestrian
    pub min_radius: f64,
    /// Radius of a fully relaxed pedestrian
    pub max_radius: f64,
    /// Maximum (escape) speed
    pub vd_max: f64,
    /// Shape exponent of the speed/radius power law
    pub beta: f64,

    // === Output ===
    /// Steps between trajectory frames
    pub output_interval: u64,

    /// RNG seed; a random one is drawn (and logged) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            box_length: 20.0,
            exit_width: 1.2,
            pedestrians: 200,

            min_radius: 0.1,
            max_radius: 0.37,
            vd_max: 2.0,
            beta: 0.9,

            output_interval: 10,

            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check every documented parameter constraint
    pub fn validate(&self) -> Result<()> {
        positive("boxLength", self.box_length)?;
        positive("exitWidth", self.exit_width)?;
        positive("minRadius", self.min_radius)?;
        positive("maxRadius", self.max_radius)?;
        positive("vdMax", self.vd_max)?;
        positive("beta", self.beta)?;

        if self.min_radius >= self.max_radius {
            return Err(Error::Config(format!(
                "minRadius ({}) must be smaller than maxRadius ({})",
                self.min_radius, self.max_radius
            )));
        }
        if 2.0 * self.max_radius > self.box_length {
            return Err(Error::Config(format!(
                "a pedestrian of diameter {} does not fit in a room of side {}",
                2.0 * self.max_radius,
                self.box_length
            )));
        }
        if self.exit_width > self.box_length {
            return Err(Error::Config(format!(
                "exitWidth ({}) is wider than the room ({})",
                self.exit_width, self.box_length
            )));
        }
        if self.output_interval == 0 {
            return Err(Error::Config("outputInterval must be at least 1".into()));
        }
        CellIndex::new(self.box_length, self.interaction_range(), false)?;
        Ok(())
    }

    /// Fixed time step of the run: a fully compressed pedestrian moving at
    /// top speed covers half its radius per step
    #[inline]
    pub fn dt(&self) -> f64 {
        self.min_radius / (2.0 * self.vd_max)
    }

    /// Largest possible contact distance between two pedestrians
    #[inline]
    pub fn interaction_range(&self) -> f64 {
        2.0 * self.max_radius
    }

    pub fn room(&self) -> Room {
        Room::new(self.box_length, self.exit_width)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Config(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Initial positions, one `x y` pair per line
    pub static_input: PathBuf,
    /// Trajectory frames
    pub output: PathBuf,
    /// Per-step cumulative exit counts
    pub benchmark: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            static_input: PathBuf::from("input/static.txt"),
            output: PathBuf::from("out/output.txt"),
            benchmark: PathBuf::from("out/benchmark.txt"),
        }
    }
}

/// Door-width sweep: one entry per width, each repeated over several
/// freshly generated crowds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkConfig {
    pub exit_widths: Vec<f64>,
    /// Crowd size for each width, same length as `exit_widths`
    pub pedestrians: Vec<usize>,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
}

fn default_rounds() -> usize {
    3
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            exit_widths: vec![1.2, 1.8, 2.4, 3.0],
            pedestrians: vec![200, 260, 320, 380],
            rounds: default_rounds(),
        }
    }
}

impl BenchmarkConfig {
    /// Check the sweep against the room it runs in
    pub fn validate(&self, simulation: &SimulationConfig) -> Result<()> {
        if self.exit_widths.is_empty() {
            return Err(Error::Config("benchmarks.exitWidths is empty".into()));
        }
        if self.exit_widths.len() != self.pedestrians.len() {
            return Err(Error::Config(format!(
                "benchmarks lists {} exit widths but {} pedestrian counts",
                self.exit_widths.len(),
                self.pedestrians.len()
            )));
        }
        if self.rounds == 0 {
            return Err(Error::Config("benchmarks.rounds must be at least 1".into()));
        }
        for (exit_width, pedestrians) in self.cases() {
            SimulationConfig {
                exit_width,
                pedestrians,
                ..simulation.clone()
            }
            .validate()?;
        }
        Ok(())
    }

    /// `(exit_width, pedestrians)` pairs in sweep order
    pub fn cases(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.exit_widths
            .iter()
            .copied()
            .zip(self.pedestrians.iter().copied())
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub files: FileConfig,
    /// Only needed by the door-width sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<BenchmarkConfig>,
}

impl Config {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration document
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        if let Some(benchmarks) = &self.benchmarks {
            benchmarks.validate(&self.simulation)?;
        }
        Ok(())
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Configuration written to {}", path.display());
        Ok(())
    }
}
