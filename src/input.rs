//! Initial-position file
//!
//! One pedestrian per line, `x y` separated by whitespace. Blank lines are
//! skipped; anything else that is not exactly two numbers aborts the run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::DVec2;

use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::sim::Particle;

/// Parse positions from any line source
pub fn parse_positions<R: BufRead>(reader: R) -> Result<Vec<DVec2>> {
    let mut positions = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let number = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 2 {
            return Err(Error::MalformedInput {
                line: number,
                reason: format!("expected 2 fields, found {}", fields.len()),
            });
        }

        let coord = |s: &str| -> Result<f64> {
            let v: f64 = s.parse().map_err(|_| Error::MalformedInput {
                line: number,
                reason: format!("{s:?} is not a number"),
            })?;
            if !v.is_finite() {
                return Err(Error::MalformedInput {
                    line: number,
                    reason: format!("{s:?} is not finite"),
                });
            }
            Ok(v)
        };
        positions.push(DVec2::new(coord(fields[0])?, coord(fields[1])?));
    }
    Ok(positions)
}

/// Read positions from a file
pub fn read_positions(path: &Path) -> Result<Vec<DVec2>> {
    let file = File::open(path)?;
    let positions = parse_positions(BufReader::new(file))?;
    log::info!("Read {} positions from {}", positions.len(), path.display());
    Ok(positions)
}

/// Pedestrians at rest, fully compressed, ids in line order
pub fn spawn_particles(positions: &[DVec2], cfg: &SimulationConfig) -> Vec<Particle> {
    positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| Particle::new(i as u32, pos, cfg.min_radius))
        .collect()
}
