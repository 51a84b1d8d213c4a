// maze/analysis.rs - Reachability, wall symmetry and text dumps of a carved maze

use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;

use crate::error_handling::{MazeError, Result};
use crate::types::{Direction, GridPos};

use super::data::{CellRef, MazeData};

/// A neighbor pair whose two chunks disagree about the wall between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AsymmetricPair {
    pub from: GridPos,
    pub to: GridPos,
    pub direction: Direction,
    pub from_sees_wall: bool,
    pub to_sees_wall: bool,
}

impl From<AsymmetricPair> for MazeError {
    fn from(pair: AsymmetricPair) -> Self {
        MazeError::AsymmetricWall {
            from: pair.from,
            to: pair.to,
            from_sees_wall: pair.from_sees_wall,
            to_sees_wall: pair.to_sees_wall,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub total_cells: usize,
    pub reachable_cells: usize,
    pub asymmetric_walls: Vec<AsymmetricPair>,
}

impl ValidationReport {
    pub fn is_connected(&self) -> bool {
        self.reachable_cells == self.total_cells
    }

    pub fn is_symmetric(&self) -> bool {
        self.asymmetric_walls.is_empty()
    }

    /// First failure as an error; symmetry is reported before connectivity.
    pub fn into_result(self) -> Result<()> {
        if let Some(pair) = self.asymmetric_walls.first() {
            return Err((*pair).into());
        }
        if !self.is_connected() {
            return Err(MazeError::Disconnected {
                reachable: self.reachable_cells,
                total: self.total_cells,
            });
        }
        Ok(())
    }
}

/// Global cells reachable from `start` through open walls.
pub fn flood_fill(data: &MazeData, start: GridPos) -> HashSet<GridPos> {
    let mut seen = HashSet::new();
    let Some(origin) = data.to_local(start) else {
        return seen;
    };

    let mut queue = VecDeque::from([origin]);
    seen.insert(start);

    while let Some(at) = queue.pop_front() {
        for direction in Direction::ALL {
            if data.has_wall(at, direction) {
                continue;
            }
            let Some(next) = data.neighbor(at, direction) else {
                continue;
            };
            if seen.insert(data.to_global(next.chunk, next.cell)) {
                queue.push_back(next);
            }
        }
    }
    seen
}

pub fn is_fully_connected(data: &MazeData) -> bool {
    flood_fill(data, GridPos::new(0, 0)).len() == data.total_cells()
}

/// Every adjacent pair whose walls disagree, each pair listed once.
pub fn asymmetric_walls(data: &MazeData) -> Vec<AsymmetricPair> {
    let mut found = Vec::new();
    for at in data.cells() {
        for direction in [Direction::North, Direction::East] {
            let Some(next) = data.neighbor(at, direction) else {
                continue;
            };
            let from_sees_wall = data.has_wall(at, direction);
            let to_sees_wall = data.has_wall(next, direction.opposite());
            if from_sees_wall != to_sees_wall {
                found.push(AsymmetricPair {
                    from: data.to_global(at.chunk, at.cell),
                    to: data.to_global(next.chunk, next.cell),
                    direction,
                    from_sees_wall,
                    to_sees_wall,
                });
            }
        }
    }
    found
}

pub fn validate(data: &MazeData) -> ValidationReport {
    ValidationReport {
        total_cells: data.total_cells(),
        reachable_cells: flood_fill(data, GridPos::new(0, 0)).len(),
        asymmetric_walls: asymmetric_walls(data),
    }
}

/// Text picture of the walls, north at the top.
pub fn render_ascii(data: &MazeData) -> String {
    let width = data.total_cells_x();
    let depth = data.total_cells_z();
    let wall = |global: GridPos, direction: Direction| -> bool {
        data.to_local(global).map_or(true, |at: CellRef| data.has_wall(at, direction))
    };

    let mut out = String::new();
    for z in (0..depth).rev() {
        out.push('+');
        for x in 0..width {
            out.push_str(if wall(GridPos::new(x, z), Direction::North) { "---+" } else { "   +" });
        }
        out.push('\n');

        out.push(if wall(GridPos::new(0, z), Direction::West) { '|' } else { ' ' });
        for x in 0..width {
            out.push_str("   ");
            out.push(if wall(GridPos::new(x, z), Direction::East) { '|' } else { ' ' });
        }
        out.push('\n');
    }

    out.push('+');
    for x in 0..width {
        out.push_str(if wall(GridPos::new(x, 0), Direction::South) { "---+" } else { "   +" });
    }
    let _ = writeln!(out);
    out
}
