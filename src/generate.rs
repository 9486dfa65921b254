//! Initial crowd layouts
//!
//! The room floor is cut into square slots one maximum diameter wide and
//! pedestrians are dropped at the centre of distinct random slots, so nobody
//! starts in contact even once fully relaxed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::DVec2;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::SimulationConfig;
use crate::error::{Error, Result};

/// Slot centres for `cfg.pedestrians` pedestrians, in draw order.
///
/// Returns fewer positions than requested when the room runs out of slots.
pub fn grid_layout<R: Rng>(cfg: &SimulationConfig, rng: &mut R) -> Result<Vec<DVec2>> {
    let slot = cfg.interaction_range();
    let per_side = (cfg.box_length / slot).floor() as usize;
    if per_side == 0 {
        return Err(Error::DegenerateGrid(format!(
            "box length {} holds no slot of side {}",
            cfg.box_length, slot
        )));
    }

    let mut slots: Vec<(usize, usize)> = (0..per_side)
        .flat_map(|i| (0..per_side).map(move |j| (i, j)))
        .collect();
    if cfg.pedestrians > slots.len() {
        log::warn!(
            "Only {} of {} pedestrians fit in the room",
            slots.len(),
            cfg.pedestrians
        );
    }

    let wanted = cfg.pedestrians.min(slots.len());
    let (chosen, _) = slots.partial_shuffle(rng, wanted);
    Ok(chosen
        .iter()
        .map(|&(i, j)| DVec2::new(slot * (i as f64 + 0.5), slot * (j as f64 + 0.5)))
        .collect())
}

/// Write positions as `x y` lines with two decimals
pub fn write_positions(path: &Path, positions: &[DVec2]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    for p in positions {
        writeln!(out, "{:.2} {:.2}", p.x, p.y)?;
    }
    out.flush()?;
    log::info!("Wrote {} positions to {}", positions.len(), path.display());
    Ok(())
}
