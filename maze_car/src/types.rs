// types.rs - Shared grid coordinate and node types
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::animation::Vec3;

/// Integer grid coordinate on the XZ plane.
///
/// The same type addresses chunks, local cells and global cells; which one a
/// value means is decided by the API it is passed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn manhattan(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

impl std::ops::Add for GridPos {
    type Output = GridPos;
    #[inline]
    fn add(self, other: GridPos) -> GridPos {
        GridPos::new(self.x + other.x, self.z + other.z)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Axis direction on the grid.
///
/// Indices follow the car's numbering: 0 = forward (+Z), 1 = right (+X),
/// 2 = back (-Z), 3 = left (-X).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Carving/repair priority order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    #[inline]
    pub fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }

    #[inline]
    pub fn offset(self) -> GridPos {
        match self {
            Direction::North => GridPos::new(0, 1),
            Direction::East => GridPos::new(1, 0),
            Direction::South => GridPos::new(0, -1),
            Direction::West => GridPos::new(-1, 0),
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    #[inline]
    pub fn turned_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    #[inline]
    pub fn turned_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Yaw in degrees, clockwise from +Z when seen from above.
    #[inline]
    pub fn heading_degrees(self) -> f32 {
        self.index() as f32 * 90.0
    }

    /// Name reported by the control API.
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "forward",
            Direction::East => "right",
            Direction::South => "backward",
            Direction::West => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Navigation record for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub chunk: GridPos,
    pub cell: GridPos,
    pub global: GridPos,
    pub world: Vec3,
}
