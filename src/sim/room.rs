//! Room geometry: the four walls, the door, and the contact tests against them
//!
//! The room is the square `[0, L] x [0, L]`. The door is a gap of width `W`
//! centered on the bottom wall (y = 0).

use glam::DVec2;

use crate::consts::{DECISION_HI, DECISION_LO};

/// One of the room's four boundary segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

/// Push-back direction per wall, indexed by `Wall as usize`
const WALL_DIRECTIONS: [DVec2; 4] = [
    DVec2::new(1.0, 0.0),
    DVec2::new(-1.0, 0.0),
    DVec2::new(0.0, -1.0),
    DVec2::new(0.0, 1.0),
];

impl Wall {
    pub const ALL: [Wall; 4] = [Wall::Left, Wall::Right, Wall::Top, Wall::Bottom];

    /// Unit vector pointing from the wall into the room
    #[inline]
    pub fn direction(self) -> DVec2 {
        WALL_DIRECTIONS[self as usize]
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of walls a single pedestrian is touching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallSet(u8);

impl WallSet {
    pub const EMPTY: WallSet = WallSet(0);

    pub fn insert(&mut self, wall: Wall) {
        self.0 |= wall.bit();
    }

    pub fn contains(self, wall: Wall) -> bool {
        self.0 & wall.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Wall> {
        Wall::ALL.into_iter().filter(move |w| self.contains(*w))
    }

    /// Sum of the push-back directions of every wall in the set
    pub fn escape_direction(self) -> DVec2 {
        self.iter().map(Wall::direction).sum()
    }
}

impl FromIterator<Wall> for WallSet {
    fn from_iter<I: IntoIterator<Item = Wall>>(iter: I) -> Self {
        let mut set = WallSet::EMPTY;
        for wall in iter {
            set.insert(wall);
        }
        set
    }
}

/// Square room with a single door in the middle of the bottom wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Room {
    pub box_length: f64,
    pub exit_width: f64,
}

impl Room {
    pub fn new(box_length: f64, exit_width: f64) -> Self {
        Self {
            box_length,
            exit_width,
        }
    }

    /// Door jambs `(left, right)` on the x axis
    #[inline]
    pub fn exit_span(&self) -> (f64, f64) {
        let mid = self.box_length / 2.0;
        let half = self.exit_width / 2.0;
        (mid - half, mid + half)
    }

    /// Central band of the door; a pedestrian already inside it walks
    /// straight down instead of picking a new target
    #[inline]
    pub fn decision_interval(&self) -> (f64, f64) {
        let (left, _) = self.exit_span();
        (
            left + DECISION_LO * self.exit_width,
            left + DECISION_HI * self.exit_width,
        )
    }

    /// Walls touched by a disk. The bottom wall is not a wall across the
    /// door, and stops counting once the pedestrian is out of the room.
    pub fn walls_touching(&self, pos: DVec2, radius: f64, exited: bool) -> WallSet {
        let mut walls = WallSet::EMPTY;

        if pos.x - radius <= 0.0 {
            walls.insert(Wall::Left);
        } else if pos.x + radius >= self.box_length {
            walls.insert(Wall::Right);
        }

        let (left, right) = self.exit_span();
        let beside_door = pos.x - radius < left || pos.x + radius > right;
        if !exited && pos.y - radius <= 0.0 && beside_door {
            walls.insert(Wall::Bottom);
        } else if pos.y + radius >= self.box_length {
            walls.insert(Wall::Top);
        }

        walls
    }

    /// Whether a disk's leading edge has crossed the door line while fully
    /// inside the door span
    pub fn is_through_exit(&self, pos: DVec2, radius: f64) -> bool {
        let (left, right) = self.exit_span();
        pos.y - radius <= 0.0 && pos.x - radius >= left && pos.x + radius <= right
    }
}
