//! Deterministic simulation module
//!
//! All model logic lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (input order of pedestrians)
//! - No file or platform dependencies

pub mod cell_index;
pub mod room;
pub mod state;
pub mod tick;

pub use cell_index::{CellIndex, ContactGraph, brute_force_contacts};
pub use room::{Room, Wall, WallSet};
pub use state::{Contact, Particle};
pub use tick::{SimPhase, Simulation, StepReport};
