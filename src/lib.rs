//! pedsim - granular "escape panic" evacuation of a square room
//!
//! Core modules:
//! - `sim`: Deterministic simulation (cell index, contact rules, stepper)
//! - `config`: Run parameters loaded once at startup
//! - `input` / `output`: Initial positions and trajectory/benchmark files
//! - `runner`: Batch driver tying the above together
//! - `generate`: Random initial layouts
//! - `stats`: Flow-rate summary of a finished run

pub mod config;
pub mod error;
pub mod generate;
pub mod input;
pub mod output;
pub mod runner;
pub mod sim;
pub mod stats;

pub use config::{BenchmarkConfig, Config, FileConfig, SimulationConfig};
pub use error::{Error, Result};

use glam::DVec2;

/// Model constants
pub mod consts {
    /// Time for a free pedestrian to regrow from zero to full radius (seconds)
    pub const RELAXATION_TIME: f64 = 0.5;

    /// Below this height a pedestrian has cleared the scene and is removed
    pub const DEPARTURE_Y: f64 = -2.0;

    /// Door y-coordinate (the room's bottom edge)
    pub const DOOR_Y: f64 = 0.0;

    /// Left edge of the decision interval, as a fraction of the door width
    /// from its left jamb
    pub const DECISION_LO: f64 = 0.2;

    /// Right edge of the decision interval, same measure
    pub const DECISION_HI: f64 = 0.8;
}

/// Unit vector for a heading angle
#[inline]
pub fn heading_to_unit(theta: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin())
}

/// Heading angle of a (not necessarily normalized) direction
///
/// A zero vector yields 0 (east), matching `atan2(0, 0)`.
#[inline]
pub fn heading_of(dir: DVec2) -> f64 {
    dir.y.atan2(dir.x)
}
