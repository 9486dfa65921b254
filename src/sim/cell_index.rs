//! Cell index method for contact detection
//!
//! The room is split into an M x M grid of square cells at least as wide as
//! the largest possible contact distance, so two touching pedestrians always
//! sit in the same or in adjacent cells. Each cell is compared with itself and
//! with half of its Moore neighbourhood, which visits every unordered pair of
//! adjacent cells exactly once instead of testing all N^2 pairs.

use glam::DVec2;

use super::state::Particle;
use crate::error::{Error, Result};

/// Right, up-left, up, up-right: half of the 8 Moore neighbours
const HALF_STENCIL: [(i64, i64); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Largest grid the index will allocate buckets for on every query
pub const MAX_CELLS: usize = 1 << 20;

/// Symmetric contact relation, indexed by slot in the particle slice it was
/// computed from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactGraph {
    neighbours: Vec<Vec<usize>>,
}

impl ContactGraph {
    fn with_len(len: usize) -> Self {
        Self {
            neighbours: vec![Vec::new(); len],
        }
    }

    fn connect(&mut self, a: usize, b: usize) {
        self.neighbours[a].push(b);
        self.neighbours[b].push(a);
    }

    /// Sort each neighbour list and drop repeats (small periodic grids can
    /// reach the same cell pair twice)
    fn finish(mut self) -> Self {
        for list in &mut self.neighbours {
            list.sort_unstable();
            list.dedup();
        }
        self
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    /// Slots touching `slot`, ascending
    pub fn neighbours(&self, slot: usize) -> &[usize] {
        &self.neighbours[slot]
    }

    pub fn in_contact(&self, slot: usize) -> bool {
        !self.neighbours[slot].is_empty()
    }

    /// Number of unordered touching pairs
    pub fn pair_count(&self) -> usize {
        self.neighbours.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Every touching pair once, as `(low, high)`, in ascending order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbours.iter().enumerate().flat_map(|(i, list)| {
            list.iter().copied().filter(move |&j| j > i).map(move |j| (i, j))
        })
    }
}

/// Distance rule shared by the grid and the brute-force reference
#[derive(Debug, Clone, Copy)]
struct Metric {
    box_length: f64,
    periodic: bool,
}

impl Metric {
    fn separation(&self, a: DVec2, b: DVec2) -> DVec2 {
        let d = b - a;
        if self.periodic {
            d - self.box_length * (d / self.box_length).round()
        } else {
            d
        }
    }

    /// Disks overlap or touch
    #[inline]
    fn touches(&self, a: &Particle, b: &Particle) -> bool {
        self.separation(a.pos, b.pos).length() <= a.radius + b.radius
    }
}

/// Grid parameters for one room; cheap to keep, rebuilt cells every call
#[derive(Debug, Clone)]
pub struct CellIndex {
    metric: Metric,
    range: f64,
    cells_per_side: usize,
    cell_size: f64,
}

impl CellIndex {
    /// Grid over `[0, box_length)^2` for contact distances up to `range`
    ///
    /// Errors with `DegenerateGrid` when `range` is not finite, not positive,
    /// or larger than the box.
    pub fn new(box_length: f64, range: f64, periodic: bool) -> Result<Self> {
        if !box_length.is_finite() || box_length <= 0.0 {
            return Err(Error::DegenerateGrid(format!(
                "box length must be finite and > 0, got {box_length}"
            )));
        }
        if !range.is_finite() || range <= 0.0 {
            return Err(Error::DegenerateGrid(format!(
                "interaction range must be finite and > 0, got {range}"
            )));
        }
        if range > box_length {
            return Err(Error::DegenerateGrid(format!(
                "interaction range {range} exceeds box length {box_length}"
            )));
        }

        let cells_per_side = ((box_length / range).floor() as usize).max(1);
        let cells = cells_per_side
            .checked_mul(cells_per_side)
            .filter(|&n| n <= MAX_CELLS)
            .ok_or_else(|| {
                Error::DegenerateGrid(format!(
                    "{cells_per_side}x{cells_per_side} cells for box length {box_length} and range {range} exceeds the limit of {MAX_CELLS}"
                ))
            })?;
        log::trace!("cell index: {cells} cells of side {}", box_length / cells_per_side as f64);

        Ok(Self {
            metric: Metric {
                box_length,
                periodic,
            },
            range,
            cells_per_side,
            cell_size: box_length / cells_per_side as f64,
        })
    }

    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn is_periodic(&self) -> bool {
        self.metric.periodic
    }

    /// Cell column/row of one coordinate. Points outside the box are clamped
    /// into the edge cells, or wrapped when periodic.
    fn cell_coord(&self, v: f64) -> usize {
        let m = self.cells_per_side as i64;
        let v = if self.metric.periodic {
            v.rem_euclid(self.metric.box_length)
        } else {
            v
        };
        ((v / self.cell_size).floor() as i64).clamp(0, m - 1) as usize
    }

    /// Neighbour cell at an offset, or `None` past a non-periodic edge
    fn shift(&self, cx: usize, cy: usize, (dx, dy): (i64, i64)) -> Option<usize> {
        let m = self.cells_per_side as i64;
        let (mut nx, mut ny) = (cx as i64 + dx, cy as i64 + dy);
        if self.metric.periodic {
            nx = nx.rem_euclid(m);
            ny = ny.rem_euclid(m);
        } else if nx < 0 || nx >= m || ny < 0 || ny >= m {
            return None;
        }
        Some(ny as usize * self.cells_per_side + nx as usize)
    }

    /// Full contact graph of `particles`
    ///
    /// Errors with `Invariant` if a particle is too large for the grid to
    /// guarantee its contacts land in adjacent cells.
    pub fn compute(&self, particles: &[Particle]) -> Result<ContactGraph> {
        if let Some(p) = particles.iter().find(|p| 2.0 * p.radius > self.range) {
            return Err(Error::Invariant(format!(
                "pedestrian {} of radius {} exceeds the grid interaction range {}",
                p.id, p.radius, self.range
            )));
        }

        let m = self.cells_per_side;
        let mut cells: Vec<Vec<usize>> = vec![Vec::new(); m * m];
        for (slot, p) in particles.iter().enumerate() {
            let idx = self.cell_coord(p.pos.y) * m + self.cell_coord(p.pos.x);
            cells[idx].push(slot);
        }

        let mut graph = ContactGraph::with_len(particles.len());
        for cy in 0..m {
            for cx in 0..m {
                let here = &cells[cy * m + cx];
                if here.is_empty() {
                    continue;
                }

                for (k, &a) in here.iter().enumerate() {
                    for &b in &here[k + 1..] {
                        if self.metric.touches(&particles[a], &particles[b]) {
                            graph.connect(a, b);
                        }
                    }
                }

                for offset in HALF_STENCIL {
                    let Some(n) = self.shift(cx, cy, offset) else {
                        continue;
                    };
                    for &a in here {
                        for &b in &cells[n] {
                            if a != b && self.metric.touches(&particles[a], &particles[b]) {
                                graph.connect(a, b);
                            }
                        }
                    }
                }
            }
        }

        let graph = graph.finish();
        log::trace!(
            "cell index: {} particles, {}x{} cells, {} contacts",
            particles.len(),
            m,
            m,
            graph.pair_count()
        );
        Ok(graph)
    }
}

/// O(N^2) reference: tests every pair with the same distance rule as
/// [`CellIndex::compute`]
pub fn brute_force_contacts(particles: &[Particle], box_length: f64, periodic: bool) -> ContactGraph {
    let metric = Metric {
        box_length,
        periodic,
    };
    let mut graph = ContactGraph::with_len(particles.len());
    for a in 0..particles.len() {
        for b in (a + 1)..particles.len() {
            if metric.touches(&particles[a], &particles[b]) {
                graph.connect(a, b);
            }
        }
    }
    graph.finish()
}
