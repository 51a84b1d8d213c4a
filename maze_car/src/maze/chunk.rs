// maze/chunk.rs - Boundary-inclusive wall storage for one chunk

use crate::types::{Direction, GridPos};

/// One square block of cells with its own copy of the boundary walls.
///
/// `horizontal[x][y]`, `y in 0..=size`, is the wall on the south edge of
/// row `y` (so `y = size` is the north edge of the chunk). `vertical[x][y]`,
/// `x in 0..=size`, is the wall on the west edge of column `x`.
/// Walls start present and can only ever be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeChunk {
    size: i32,
    position: GridPos,
    horizontal: Vec<bool>,
    vertical: Vec<bool>,
    visited: Vec<bool>,
}

impl MazeChunk {
    pub fn new(size: i32, position: GridPos) -> Self {
        let n = size.max(0) as usize;
        Self {
            size,
            position,
            horizontal: vec![true; n * (n + 1)],
            vertical: vec![true; (n + 1) * n],
            visited: vec![false; n * n],
        }
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    #[inline]
    pub fn position(&self) -> GridPos {
        self.position
    }

    #[inline]
    fn horizontal_index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && x < self.size && y >= 0 && y <= self.size)
            .then(|| x as usize * (self.size as usize + 1) + y as usize)
    }

    #[inline]
    fn vertical_index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && x <= self.size && y >= 0 && y < self.size)
            .then(|| x as usize * self.size as usize + y as usize)
    }

    #[inline]
    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        self.contains_cell(x, y).then(|| x as usize * self.size as usize + y as usize)
    }

    #[inline]
    pub fn contains_cell(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.size && y >= 0 && y < self.size
    }

    /// Out-of-range reads report a wall.
    pub fn has_horizontal_wall(&self, x: i32, y: i32) -> bool {
        self.horizontal_index(x, y).map_or(true, |i| self.horizontal[i])
    }

    /// Out-of-range reads report a wall.
    pub fn has_vertical_wall(&self, x: i32, y: i32) -> bool {
        self.vertical_index(x, y).map_or(true, |i| self.vertical[i])
    }

    /// Out-of-range calls are ignored; callers crossing chunk seams rely on it.
    pub fn remove_horizontal_wall(&mut self, x: i32, y: i32) {
        if let Some(i) = self.horizontal_index(x, y) {
            self.horizontal[i] = false;
        }
    }

    /// Out-of-range calls are ignored; callers crossing chunk seams rely on it.
    pub fn remove_vertical_wall(&mut self, x: i32, y: i32) {
        if let Some(i) = self.vertical_index(x, y) {
            self.vertical[i] = false;
        }
    }

    /// Wall on the `direction` side of local cell `cell`, as stored in this chunk.
    pub fn has_wall(&self, cell: GridPos, direction: Direction) -> bool {
        match direction {
            Direction::North => self.has_horizontal_wall(cell.x, cell.z + 1),
            Direction::South => self.has_horizontal_wall(cell.x, cell.z),
            Direction::East => self.has_vertical_wall(cell.x + 1, cell.z),
            Direction::West => self.has_vertical_wall(cell.x, cell.z),
        }
    }

    pub fn remove_wall(&mut self, cell: GridPos, direction: Direction) {
        match direction {
            Direction::North => self.remove_horizontal_wall(cell.x, cell.z + 1),
            Direction::South => self.remove_horizontal_wall(cell.x, cell.z),
            Direction::East => self.remove_vertical_wall(cell.x + 1, cell.z),
            Direction::West => self.remove_vertical_wall(cell.x, cell.z),
        }
    }

    pub fn is_visited(&self, cell: GridPos) -> bool {
        self.cell_index(cell.x, cell.z).map_or(false, |i| self.visited[i])
    }

    pub fn mark_visited(&mut self, cell: GridPos) {
        if let Some(i) = self.cell_index(cell.x, cell.z) {
            self.visited[i] = true;
        }
    }

    pub fn horizontal_walls(&self) -> &[bool] {
        &self.horizontal
    }

    pub fn vertical_walls(&self) -> &[bool] {
        &self.vertical
    }
}
