// maze/data.rs - Chunk grid ownership and global/local coordinate mapping

use crate::config::MazeConfig;
use crate::error_handling::Result;
use crate::types::{Direction, GridPos};

use super::chunk::MazeChunk;

/// A cell addressed by its chunk and its local coordinate inside that chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub chunk: GridPos,
    pub cell: GridPos,
}

impl CellRef {
    pub const fn new(chunk: GridPos, cell: GridPos) -> Self {
        Self { chunk, cell }
    }
}

#[derive(Debug, Clone)]
pub struct MazeData {
    chunk_size: i32,
    size_in_chunks: GridPos,
    // Column-major: index = chunk.x * size_in_chunks.z + chunk.z
    chunks: Vec<MazeChunk>,
    start_chunk: GridPos,
    start_cell: GridPos,
    start_cells: Vec<GridPos>,
}

impl MazeData {
    /// Fully walled, unvisited grid with the start point at the grid center.
    pub fn new(chunk_size: i32, size_in_chunks: GridPos) -> Self {
        let mut chunks = Vec::with_capacity((size_in_chunks.x.max(0) * size_in_chunks.z.max(0)) as usize);
        for chunk_x in 0..size_in_chunks.x {
            for chunk_z in 0..size_in_chunks.z {
                chunks.push(MazeChunk::new(chunk_size, GridPos::new(chunk_x, chunk_z)));
            }
        }

        Self {
            chunk_size,
            size_in_chunks,
            chunks,
            start_chunk: GridPos::new(size_in_chunks.x / 2, size_in_chunks.z / 2),
            start_cell: GridPos::new(chunk_size / 2, chunk_size / 2),
            start_cells: Vec::new(),
        }
    }

    pub fn from_config(config: &MazeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.chunk_size, config.size_in_chunks))
    }

    #[inline]
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    #[inline]
    pub fn size_in_chunks(&self) -> GridPos {
        self.size_in_chunks
    }

    #[inline]
    pub fn total_cells_x(&self) -> i32 {
        self.size_in_chunks.x * self.chunk_size
    }

    #[inline]
    pub fn total_cells_z(&self) -> i32 {
        self.size_in_chunks.z * self.chunk_size
    }

    pub fn total_cells(&self) -> usize {
        self.total_cells_x().max(0) as usize * self.total_cells_z().max(0) as usize
    }

    pub fn start_generation_chunk(&self) -> GridPos {
        self.start_chunk
    }

    pub fn start_generation_cell(&self) -> GridPos {
        self.start_cell
    }

    /// Cells of the finish room; empty when no room was carved.
    pub fn start_generation_cells(&self) -> &[GridPos] {
        &self.start_cells
    }

    pub(crate) fn set_start_generation_cells(&mut self, cells: Vec<GridPos>) {
        self.start_cells = cells;
    }

    // ------------------------------------------------------------------
    // Index
    // ------------------------------------------------------------------

    #[inline]
    pub fn chunk_exists(&self, chunk: GridPos) -> bool {
        chunk.x >= 0 && chunk.x < self.size_in_chunks.x && chunk.z >= 0 && chunk.z < self.size_in_chunks.z
    }

    #[inline]
    fn chunk_index(&self, chunk: GridPos) -> Option<usize> {
        self.chunk_exists(chunk)
            .then(|| (chunk.x * self.size_in_chunks.z + chunk.z) as usize)
    }

    pub fn chunk(&self, chunk: GridPos) -> Option<&MazeChunk> {
        self.chunk_index(chunk).map(|i| &self.chunks[i])
    }

    pub fn chunk_mut(&mut self, chunk: GridPos) -> Option<&mut MazeChunk> {
        self.chunk_index(chunk).map(move |i| &mut self.chunks[i])
    }

    pub fn chunks(&self) -> impl Iterator<Item = &MazeChunk> {
        self.chunks.iter()
    }

    #[inline]
    pub fn to_global(&self, chunk: GridPos, cell: GridPos) -> GridPos {
        GridPos::new(
            chunk.x * self.chunk_size + cell.x,
            chunk.z * self.chunk_size + cell.z,
        )
    }

    /// Inverse of [`MazeData::to_global`]; `None` outside the maze.
    pub fn to_local(&self, global: GridPos) -> Option<CellRef> {
        let chunk = GridPos::new(
            global.x.div_euclid(self.chunk_size),
            global.z.div_euclid(self.chunk_size),
        );
        let cell = GridPos::new(
            global.x.rem_euclid(self.chunk_size),
            global.z.rem_euclid(self.chunk_size),
        );
        self.chunk_exists(chunk).then_some(CellRef::new(chunk, cell))
    }

    pub fn contains(&self, at: CellRef) -> bool {
        self.chunk(at.chunk).map_or(false, |c| c.contains_cell(at.cell.x, at.cell.z))
    }

    /// Chunk exists and the cell has not been carved into yet.
    pub fn is_valid_uncarved_cell(&self, at: CellRef) -> bool {
        self.contains(at) && !self.is_visited(at)
    }

    /// One step in `direction`, wrapping onto the mirrored edge of the adjacent
    /// chunk. The result may name a chunk that does not exist.
    pub fn step(&self, from: CellRef, direction: Direction) -> CellRef {
        let offset = direction.offset();
        let mut chunk = from.chunk;
        let mut cell = from.cell + offset;

        if cell.x < 0 {
            chunk.x -= 1;
            cell.x = self.chunk_size - 1;
        } else if cell.x >= self.chunk_size {
            chunk.x += 1;
            cell.x = 0;
        }

        if cell.z < 0 {
            chunk.z -= 1;
            cell.z = self.chunk_size - 1;
        } else if cell.z >= self.chunk_size {
            chunk.z += 1;
            cell.z = 0;
        }

        CellRef::new(chunk, cell)
    }

    /// Like [`MazeData::step`] but only for targets inside the maze.
    pub fn neighbor(&self, from: CellRef, direction: Direction) -> Option<CellRef> {
        let to = self.step(from, direction);
        self.contains(to).then_some(to)
    }

    // ------------------------------------------------------------------
    // Walls and carve progress
    // ------------------------------------------------------------------

    /// Wall on the `direction` side of `at`, read from `at`'s own chunk.
    pub fn has_wall(&self, at: CellRef, direction: Direction) -> bool {
        self.chunk(at.chunk).map_or(true, |c| c.has_wall(at.cell, direction))
    }

    /// Clear the wall between `from` and its neighbor in `direction`.
    ///
    /// Within a chunk this is one shared entry; across a seam both chunks'
    /// edge arrays are written. Returns false when there is no neighbor.
    pub fn remove_wall_between(&mut self, from: CellRef, direction: Direction) -> bool {
        let Some(to) = self.neighbor(from, direction) else {
            return false;
        };

        if let Some(chunk) = self.chunk_mut(from.chunk) {
            chunk.remove_wall(from.cell, direction);
        }
        if to.chunk != from.chunk {
            if let Some(chunk) = self.chunk_mut(to.chunk) {
                chunk.remove_wall(to.cell, direction.opposite());
            }
        }
        true
    }

    pub fn is_visited(&self, at: CellRef) -> bool {
        self.chunk(at.chunk).map_or(false, |c| c.is_visited(at.cell))
    }

    pub fn mark_visited(&mut self, at: CellRef) {
        if let Some(chunk) = self.chunk_mut(at.chunk) {
            chunk.mark_visited(at.cell);
        }
    }

    /// Every cell, ordered by chunk x, chunk z, cell x, cell z.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        let size = self.chunk_size;
        self.chunks.iter().flat_map(move |chunk| {
            let position = chunk.position();
            (0..size).flat_map(move |x| {
                (0..size).map(move |z| CellRef::new(position, GridPos::new(x, z)))
            })
        })
    }
}
