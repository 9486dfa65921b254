//! Fixed timestep stepper
//!
//! One step reads a single snapshot of the crowd taken at its start: contacts,
//! rate updates and position updates never see another pedestrian's
//! mid-step state.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::cell_index::CellIndex;
use super::room::{Room, WallSet};
use super::state::{Contact, Particle};
use crate::config::SimulationConfig;
use crate::error::Result;

/// Stepper lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// Pedestrians remain in the scene
    Running,
    /// Everyone has left; stepping is a no-op
    Done,
}

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Pedestrians dropped from the scene
    pub removed: usize,
    /// Pedestrians that went through the door
    pub exited: usize,
    /// Pedestrian pairs plus wall contacts seen at the start of the step
    pub collisions: u64,
}

/// Evacuation of one room
#[derive(Debug, Clone)]
pub struct Simulation<R = Pcg32> {
    cfg: SimulationConfig,
    room: Room,
    index: CellIndex,
    particles: Vec<Particle>,
    time: f64,
    dt: f64,
    steps: u64,
    exited: u64,
    collisions: u64,
    rng: R,
}

impl Simulation<Pcg32> {
    /// Simulation driven by a `Pcg32` seeded with `seed`
    pub fn new(cfg: SimulationConfig, particles: Vec<Particle>, seed: u64) -> Result<Self> {
        Self::with_rng(cfg, particles, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Simulation drawing door targets from `rng`
    pub fn with_rng(cfg: SimulationConfig, particles: Vec<Particle>, rng: R) -> Result<Self> {
        cfg.validate()?;
        for p in &particles {
            p.check_radius(&cfg)?;
        }

        let index = CellIndex::new(cfg.box_length, cfg.interaction_range(), false)?;
        let dt = cfg.dt();
        log::debug!(
            "{} pedestrians, dt={}, grid {}x{} cells of {:.3}",
            particles.len(),
            dt,
            index.cells_per_side(),
            index.cells_per_side(),
            index.cell_size()
        );

        Ok(Self {
            room: cfg.room(),
            cfg,
            index,
            particles,
            time: 0.0,
            dt,
            steps: 0,
            exited: 0,
            collisions: 0,
            rng,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.cfg
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Pedestrians still in the scene, in input order
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Simulated time (seconds)
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Pedestrians that went through the door so far
    pub fn exited(&self) -> u64 {
        self.exited
    }

    /// Cumulative contact count
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn phase(&self) -> SimPhase {
        if self.particles.is_empty() {
            SimPhase::Done
        } else {
            SimPhase::Running
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase() == SimPhase::Done
    }

    /// Advance one fixed step
    pub fn step(&mut self) -> Result<StepReport> {
        if self.is_done() {
            return Ok(StepReport::default());
        }

        // Contacts at the start of the step
        let contacts = self.index.compute(&self.particles)?;
        let walls: Vec<WallSet> = self
            .particles
            .iter()
            .map(|p| self.room.walls_touching(p.pos, p.radius, p.has_exited()))
            .collect();

        let wall_hits: usize = walls.iter().map(|w| w.len()).sum();
        let collisions = (contacts.pair_count() + wall_hits) as u64;
        self.collisions += collisions;

        // Radius and speed
        for (slot, p) in self.particles.iter_mut().enumerate() {
            let in_contact = contacts.in_contact(slot) || !walls[slot].is_empty();
            p.update_radius(&self.cfg, self.dt, in_contact);
            p.check_radius(&self.cfg)?;
            p.update_speed(&self.cfg, in_contact);
        }

        // Positions, all escaping from where the crowd stood at step start
        let snapshot: Vec<DVec2> = self.particles.iter().map(|p| p.pos).collect();
        let mut exited = 0;
        for (slot, p) in self.particles.iter_mut().enumerate() {
            let contact = Contact {
                neighbours: contacts.neighbours(slot),
                snapshot: &snapshot,
                walls: walls[slot],
            };
            if p.update_position(&self.room, self.dt, contact, &mut self.rng) {
                exited += 1;
            }
        }
        self.exited += exited as u64;

        let before = self.particles.len();
        self.particles.retain(|p| {
            if p.has_departed() && !p.has_exited() {
                log::warn!("pedestrian {} left the scene without using the door", p.id);
            }
            !p.has_departed()
        });
        let removed = before - self.particles.len();

        self.time += self.dt;
        self.steps += 1;

        log::trace!(
            "step {} t={:.4}: {} left, {} exited, {} contacts",
            self.steps,
            self.time,
            self.particles.len(),
            exited,
            collisions
        );

        Ok(StepReport {
            removed,
            exited,
            collisions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimulationConfig {
        SimulationConfig {
            box_length: 20.0,
            exit_width: 1.2,
            min_radius: 0.1,
            max_radius: 0.37,
            vd_max: 2.0,
            beta: 0.9,
            ..Default::default()
        }
    }

    fn at(id: u32, x: f64, y: f64, r: f64) -> Particle {
        Particle::new(id, DVec2::new(x, y), r)
    }

    #[test]
    fn test_overlapping_pair_contracts() {
        let cfg = cfg();
        let particles = vec![at(0, 10.0, 10.0, 0.3), at(1, 10.4, 10.0, 0.3)];
        let mut sim = Simulation::new(cfg.clone(), particles, 1).unwrap();
        let report = sim.step().unwrap();

        assert_eq!(report.collisions, 1);
        for p in sim.particles() {
            assert_eq!(p.radius, cfg.min_radius);
            assert_eq!(p.speed, cfg.vd_max);
        }
        // Pushed apart along x
        assert!(sim.particles()[0].pos.x < 10.0);
        assert!(sim.particles()[1].pos.x > 10.4);
    }

    #[test]
    fn test_time_advances_by_dt() {
        let cfg = cfg();
        let mut sim = Simulation::new(cfg.clone(), vec![at(0, 3.0, 12.0, 0.1)], 9).unwrap();
        assert_eq!(sim.dt(), cfg.min_radius / (2.0 * cfg.vd_max));

        for _ in 0..25 {
            let before = sim.time();
            sim.step().unwrap();
            assert_eq!(sim.time(), before + sim.dt());
        }
        assert_eq!(sim.steps(), 25);
    }

    #[test]
    fn test_done_is_terminal() {
        let mut sim = Simulation::new(cfg(), Vec::new(), 0).unwrap();
        assert_eq!(sim.phase(), SimPhase::Done);
        assert_eq!(sim.step().unwrap(), StepReport::default());
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn test_exit_and_removal_in_corridor() {
        let cfg = cfg();
        let mut sim = Simulation::new(cfg, vec![at(0, 10.0, -1.998, 0.1)], 2).unwrap();
        let report = sim.step().unwrap();
        assert_eq!(report.exited, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(sim.exited(), 1);
        assert!(sim.is_done());
    }

    #[test]
    fn test_oversized_initial_radius_rejected() {
        let err = Simulation::new(cfg(), vec![at(0, 5.0, 5.0, 1.0)], 0).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn test_huge_room_fails_at_construction() {
        let cfg = SimulationConfig {
            box_length: 1e10,
            ..cfg()
        };
        let err = Simulation::new(cfg, vec![at(0, 5.0, 5.0, 0.1)], 0).unwrap_err();
        assert!(matches!(err, crate::error::Error::DegenerateGrid(_)));
    }

    #[test]
    fn test_update_is_order_independent() {
        // A touching cluster: nobody draws from the RNG, so only the snapshot
        // discipline decides the outcome
        let cfg = cfg();
        let crowd = vec![
            at(0, 10.0, 10.0, 0.3),
            at(1, 10.5, 10.0, 0.3),
            at(2, 10.25, 10.4, 0.3),
            at(3, 9.6, 10.2, 0.3),
        ];
        let mut reversed = crowd.clone();
        reversed.reverse();

        let mut a = Simulation::new(cfg.clone(), crowd, 4).unwrap();
        let mut b = Simulation::new(cfg, reversed, 4).unwrap();
        a.step().unwrap();
        b.step().unwrap();

        for p in a.particles() {
            let q = b.particles().iter().find(|q| q.id == p.id).unwrap();
            assert!((p.pos - q.pos).length() < 1e-12, "pedestrian {} diverged", p.id);
        }
    }

    #[test]
    fn test_determinism() {
        let cfg = cfg();
        let crowd: Vec<Particle> = (0..30)
            .map(|i| at(i, 2.0 + (i % 6) as f64 * 2.5, 4.0 + (i / 6) as f64 * 2.5, 0.1))
            .collect();

        let mut a = Simulation::new(cfg.clone(), crowd.clone(), 77).unwrap();
        let mut b = Simulation::new(cfg, crowd, 77).unwrap();
        for _ in 0..200 {
            assert_eq!(a.step().unwrap(), b.step().unwrap());
        }
        assert_eq!(a.particles(), b.particles());
        assert_eq!(a.collisions(), b.collisions());
    }
}
