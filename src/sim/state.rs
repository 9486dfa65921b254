//! Pedestrian state and the per-step update rules
//!
//! A pedestrian is a disk whose radius shrinks to its minimum on contact and
//! relaxes back to its maximum when free. Its speed follows the radius, and
//! its heading either escapes the crowd or aims at the door.

use glam::DVec2;
use rand::Rng;

use super::room::{Room, WallSet};
use crate::config::SimulationConfig;
use crate::consts::{DEPARTURE_Y, DOOR_Y, RELAXATION_TIME};
use crate::error::{Error, Result};
use crate::{heading_of, heading_to_unit};

/// A pedestrian
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Stable identifier (input line order)
    pub id: u32,
    pub pos: DVec2,
    pub radius: f64,
    /// Speed magnitude; the heading is recomputed every step
    pub speed: f64,
    /// One-way latch, set when the pedestrian passes through the door
    exited: bool,
}

/// Everything a pedestrian touches at the start of a step
#[derive(Debug, Clone, Copy)]
pub struct Contact<'a> {
    /// Slots of touching pedestrians
    pub neighbours: &'a [usize],
    /// Step-start positions, indexed by slot
    pub snapshot: &'a [DVec2],
    pub walls: WallSet,
}

impl Contact<'_> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty() && self.walls.is_empty()
    }

    /// Sum of unit vectors pointing away from each touching pedestrian, plus
    /// each touching wall's push-back direction. Not normalized.
    pub fn escape_from(&self, pos: DVec2) -> DVec2 {
        let crowd: DVec2 = self
            .neighbours
            .iter()
            .map(|&j| (pos - self.snapshot[j]).normalize_or_zero())
            .sum();
        crowd + self.walls.escape_direction()
    }
}

impl Particle {
    /// A pedestrian at rest with the given radius
    pub fn new(id: u32, pos: DVec2, radius: f64) -> Self {
        Self {
            id,
            pos,
            radius,
            speed: 0.0,
            exited: false,
        }
    }

    #[inline]
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Far enough below the door to leave the scene
    #[inline]
    pub fn has_departed(&self) -> bool {
        self.pos.y <= DEPARTURE_Y
    }

    /// Compress on contact, otherwise regrow linearly towards the maximum
    pub fn update_radius(&mut self, cfg: &SimulationConfig, dt: f64, in_contact: bool) {
        if in_contact {
            self.radius = cfg.min_radius;
        } else if self.radius < cfg.max_radius {
            self.radius = (self.radius + cfg.max_radius * dt / RELAXATION_TIME).min(cfg.max_radius);
        }
    }

    /// Escape speed on contact, otherwise a power law of the relaxed fraction
    pub fn update_speed(&mut self, cfg: &SimulationConfig, in_contact: bool) {
        self.speed = if in_contact {
            cfg.vd_max
        } else {
            let relaxed = (self.radius - cfg.min_radius) / (cfg.max_radius - cfg.min_radius);
            cfg.vd_max * relaxed.powf(cfg.beta)
        };
    }

    /// Move one step. Returns true the step the pedestrian goes through the
    /// door.
    pub fn update_position<R: Rng>(
        &mut self,
        room: &Room,
        dt: f64,
        contact: Contact<'_>,
        rng: &mut R,
    ) -> bool {
        let mut went_through = false;

        let dir = if contact.is_empty() {
            if !self.exited && room.is_through_exit(self.pos, self.radius) {
                self.exited = true;
                went_through = true;
            }
            self.target(room, rng) - self.pos
        } else {
            contact.escape_from(self.pos)
        };

        self.pos += heading_to_unit(heading_of(dir)) * (self.speed * dt);
        went_through
    }

    /// Point a free pedestrian walks towards
    ///
    /// Outside the decision interval a fresh x is drawn inside it; inside, the
    /// pedestrian keeps its own x. Before exiting it aims at the door line,
    /// afterwards at the departure line.
    fn target<R: Rng>(&self, room: &Room, rng: &mut R) -> DVec2 {
        let (lo, hi) = room.decision_interval();
        let x = if self.pos.x < lo || self.pos.x > hi {
            rng.random_range(lo..hi)
        } else {
            self.pos.x
        };
        let y = if self.exited { DEPARTURE_Y } else { DOOR_Y };
        DVec2::new(x, y)
    }

    /// Fail fast if the radius left `[min_radius, max_radius]`
    pub fn check_radius(&self, cfg: &SimulationConfig) -> Result<()> {
        if self.radius < cfg.min_radius || self.radius > cfg.max_radius || self.radius.is_nan() {
            return Err(Error::Invariant(format!(
                "pedestrian {} has radius {} outside [{}, {}]",
                self.id, self.radius, cfg.min_radius, cfg.max_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::room::Wall;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn cfg() -> SimulationConfig {
        SimulationConfig {
            box_length: 20.0,
            exit_width: 2.0,
            min_radius: 0.1,
            max_radius: 0.4,
            vd_max: 2.0,
            beta: 0.9,
            ..Default::default()
        }
    }

    fn free() -> Contact<'static> {
        Contact {
            neighbours: &[],
            snapshot: &[],
            walls: WallSet::EMPTY,
        }
    }

    #[test]
    fn test_contact_compresses_and_speeds_up() {
        let cfg = cfg();
        let mut p = Particle::new(0, DVec2::new(5.0, 5.0), 0.3);
        p.update_radius(&cfg, cfg.dt(), true);
        p.update_speed(&cfg, true);
        assert_eq!(p.radius, cfg.min_radius);
        assert_eq!(p.speed, cfg.vd_max);
    }

    #[test]
    fn test_free_radius_grows_linearly_and_clamps() {
        let cfg = cfg();
        let dt = cfg.dt();
        let mut p = Particle::new(0, DVec2::ZERO, cfg.min_radius);
        p.update_radius(&cfg, dt, false);
        let expected = cfg.min_radius + cfg.max_radius * dt / RELAXATION_TIME;
        assert!((p.radius - expected).abs() < 1e-15);

        for _ in 0..1000 {
            p.update_radius(&cfg, dt, false);
        }
        assert_eq!(p.radius, cfg.max_radius);
    }

    #[test]
    fn test_speed_power_law_bounds() {
        for beta in [0.3, 0.9, 1.0, 2.5] {
            let cfg = SimulationConfig { beta, ..cfg() };
            let mut p = Particle::new(0, DVec2::ZERO, cfg.min_radius);
            p.update_speed(&cfg, false);
            assert_eq!(p.speed, 0.0);

            p.radius = cfg.max_radius;
            p.update_speed(&cfg, false);
            assert_eq!(p.speed, cfg.vd_max);
        }
    }

    #[test]
    fn test_speed_exponent_delays_gain() {
        let mut p = Particle::new(0, DVec2::ZERO, 0.25);
        let slow = SimulationConfig { beta: 2.0, ..cfg() };
        let fast = SimulationConfig { beta: 0.5, ..cfg() };
        p.update_speed(&slow, false);
        let v_slow = p.speed;
        p.update_speed(&fast, false);
        assert!(v_slow < p.speed);
    }

    #[test]
    fn test_escape_direction_sums_unit_vectors() {
        let snapshot = [DVec2::new(5.0, 5.0), DVec2::new(5.3, 5.0), DVec2::new(5.0, 4.0)];
        let contact = Contact {
            neighbours: &[1, 2],
            snapshot: &snapshot,
            walls: WallSet::EMPTY,
        };
        let dir = contact.escape_from(snapshot[0]);
        assert!((dir - DVec2::new(-1.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_wall_contact_pushes_inward() {
        let cfg = cfg();
        let room = cfg.room();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut p = Particle::new(0, DVec2::new(0.05, 10.0), cfg.min_radius);
        p.speed = cfg.vd_max;
        let contact = Contact {
            neighbours: &[],
            snapshot: &[],
            walls: [Wall::Left].into_iter().collect(),
        };
        p.update_position(&room, cfg.dt(), contact, &mut rng);
        assert!((p.pos.x - (0.05 + cfg.vd_max * cfg.dt())).abs() < 1e-12);
        assert!((p.pos.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_aligned_particle_walks_straight_down() {
        let cfg = cfg();
        let room = cfg.room();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut p = Particle::new(0, DVec2::new(10.0, 5.0), cfg.max_radius);
        p.speed = 1.0;
        p.update_position(&room, 0.1, free(), &mut rng);
        assert!((p.pos.x - 10.0).abs() < 1e-12);
        assert!((p.pos.y - 4.9).abs() < 1e-12);
    }

    #[test]
    fn test_unaligned_particle_heads_into_decision_interval() {
        let cfg = cfg();
        let room = cfg.room();
        let (lo, hi) = room.decision_interval();
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..50 {
            let mut p = Particle::new(0, DVec2::new(2.0, 6.0), cfg.max_radius);
            p.speed = 1.0;
            p.update_position(&room, 1.0, free(), &mut rng);
            // Extend the unit step to the door line and land inside the band
            let step = p.pos - DVec2::new(2.0, 6.0);
            let at_door = DVec2::new(2.0, 6.0) + step * (6.0 / -step.y);
            assert!(at_door.x >= lo - 1e-9 && at_door.x < hi + 1e-9);
        }
    }

    #[test]
    fn test_exit_latches_once() {
        let cfg = cfg();
        let room = cfg.room();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut p = Particle::new(0, DVec2::new(10.0, 0.2), 0.3);
        p.speed = 1.0;

        assert!(p.update_position(&room, 0.05, free(), &mut rng));
        assert!(p.has_exited());
        assert!(!p.update_position(&room, 0.05, free(), &mut rng));
        assert!(p.has_exited());
    }

    #[test]
    fn test_contact_blocks_exit_latch() {
        let cfg = cfg();
        let room = cfg.room();
        let mut rng = Pcg32::seed_from_u64(5);
        let snapshot = [DVec2::new(10.0, 0.2), DVec2::new(10.0, 0.5)];
        let mut p = Particle::new(0, snapshot[0], 0.3);
        p.speed = 1.0;
        let contact = Contact {
            neighbours: &[1],
            snapshot: &snapshot,
            walls: WallSet::EMPTY,
        };
        assert!(!p.update_position(&room, 0.05, contact, &mut rng));
        assert!(!p.has_exited());
    }

    #[test]
    fn test_departure_threshold() {
        let mut p = Particle::new(0, DVec2::new(10.0, -1.99), 0.1);
        assert!(!p.has_departed());
        p.pos.y = DEPARTURE_Y;
        assert!(p.has_departed());
    }

    #[test]
    fn test_check_radius() {
        let cfg = cfg();
        let mut p = Particle::new(4, DVec2::ZERO, cfg.max_radius);
        assert!(p.check_radius(&cfg).is_ok());
        p.radius = cfg.max_radius * 1.5;
        let err = p.check_radius(&cfg).unwrap_err();
        assert!(err.to_string().contains("pedestrian 4"));
    }
}
