// maze/carver.rs - Randomized depth-first carving across chunk seams
//
// Phases, in order: finish room, depth-first carve, connectivity repair,
// seam opening, audit. Every phase only clears walls.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::MazeConfig;
use crate::error_handling::Result;
use crate::types::{Direction, GridPos};

use super::analysis;
use super::data::{CellRef, MazeData};

const RIGHT_HAND_ORDER: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];
const LEFT_HAND_ORDER: [Direction; 4] = [Direction::North, Direction::West, Direction::South, Direction::East];

/// One level of the depth-first walk: the cell and its remaining directions.
struct Frame {
    at: CellRef,
    directions: [Direction; 4],
    next: usize,
}

pub struct MazeCarver {
    config: MazeConfig,
    data: MazeData,
    rng: StdRng,
    seed: u64,
}

impl MazeCarver {
    /// Uses `config.seed`, or draws a fresh one so the run can be replayed.
    pub fn new(config: MazeConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let data = MazeData::from_config(&config)?;
        Ok(Self {
            config,
            data,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn data(&self) -> &MazeData {
        &self.data
    }

    /// Run every phase and hand back the finished maze.
    ///
    /// With `strict_validation` a maze failing the symmetry or connectivity
    /// audit is rejected instead of returned.
    pub fn generate(mut self) -> Result<MazeData> {
        info!(
            "Generating maze: {}x{} chunks of {} cells (seed {})",
            self.config.size_in_chunks.x, self.config.size_in_chunks.z, self.config.chunk_size, self.seed
        );

        let starts = if self.config.create_finish_area {
            self.carve_finish_area()
        } else {
            vec![self.data.start_generation_cell()]
        };

        let start_chunk = self.data.start_generation_chunk();
        for cell in starts {
            self.carve_from(CellRef::new(start_chunk, cell));
        }

        let repaired = self.repair_connectivity();
        if repaired > 0 {
            warn!("Connectivity repair joined {} unreached cells", repaired);
        }
        self.open_chunk_seams();

        let report = analysis::validate(&self.data);
        if self.config.strict_validation {
            report.into_result()?;
        } else if !report.is_connected() || !report.is_symmetric() {
            warn!(
                "Maze audit failed: {}/{} cells reachable, {} asymmetric walls",
                report.reachable_cells,
                report.total_cells,
                report.asymmetric_walls.len()
            );
        }

        info!("Maze generated: {} cells", self.data.total_cells());
        Ok(self.data)
    }

    /// Open a 2x2 room around the start cell and mark it carved.
    ///
    /// Returns the room's cells; they all seed the depth-first carve.
    pub fn carve_finish_area(&mut self) -> Vec<GridPos> {
        let chunk = self.data.start_generation_chunk();
        let center = self.data.start_generation_cell();
        let size = self.data.chunk_size();

        let mut cells = Vec::with_capacity(4);
        for dx in 0..2 {
            for dz in 0..2 {
                let cell = GridPos::new(center.x - 1 + dx, center.z - 1 + dz);
                if cell.x < 0 || cell.x >= size || cell.z < 0 || cell.z >= size {
                    continue;
                }
                cells.push(cell);
                self.data.mark_visited(CellRef::new(chunk, cell));
            }
        }

        if let Some(c) = self.data.chunk_mut(chunk) {
            c.remove_vertical_wall(center.x, center.z - 1);
            c.remove_vertical_wall(center.x, center.z);
            c.remove_horizontal_wall(center.x - 1, center.z);
            c.remove_horizontal_wall(center.x, center.z);
        }

        debug!("Finish area carved at chunk {} around cell {}", chunk, center);
        self.data.set_start_generation_cells(cells.clone());
        cells
    }

    fn frame(&mut self, at: CellRef) -> Frame {
        let mut directions = if self.config.use_right_hand_rule { RIGHT_HAND_ORDER } else { LEFT_HAND_ORDER };
        directions.shuffle(&mut self.rng);
        Frame { at, directions, next: 0 }
    }

    /// Depth-first carve from `start`. Each target is marked before it is
    /// descended into, and a child is fully explored before the parent tries
    /// its next direction.
    pub fn carve_from(&mut self, start: CellRef) {
        if !self.data.contains(start) {
            return;
        }
        self.data.mark_visited(start);

        let mut stack = vec![self.frame(start)];
        while let Some(top) = stack.last_mut() {
            if top.next >= top.directions.len() {
                stack.pop();
                continue;
            }
            let direction = top.directions[top.next];
            top.next += 1;
            let at = top.at;

            let to = self.data.step(at, direction);
            if self.data.is_valid_uncarved_cell(to) {
                self.data.remove_wall_between(at, direction);
                self.data.mark_visited(to);
                let frame = self.frame(to);
                stack.push(frame);
            }
        }
    }

    /// Join every still-unvisited cell to its first visited neighbor
    /// (N, E, S, W). Repeats until nothing changes; returns the cells joined.
    pub fn repair_connectivity(&mut self) -> usize {
        let mut joined = 0;
        loop {
            let pending: Vec<CellRef> = self.data.cells().filter(|&at| !self.data.is_visited(at)).collect();
            if pending.is_empty() {
                break;
            }

            let mut progressed = false;
            for at in pending {
                let target = Direction::ALL.into_iter().find(|&direction| {
                    self.data
                        .neighbor(at, direction)
                        .map_or(false, |next| self.data.is_visited(next))
                });
                if let Some(direction) = target {
                    self.data.remove_wall_between(at, direction);
                    self.data.mark_visited(at);
                    joined += 1;
                    progressed = true;
                }
            }

            if !progressed {
                break;
            }
        }
        joined
    }

    /// Clear every shared chunk edge, writing both chunks' copies.
    pub fn open_chunk_seams(&mut self) {
        let size = self.data.chunk_size();
        let chunks = self.data.size_in_chunks();

        for chunk_x in 0..chunks.x {
            for chunk_z in 0..chunks.z {
                let chunk = GridPos::new(chunk_x, chunk_z);
                if chunk_x + 1 < chunks.x {
                    for z in 0..size {
                        self.data
                            .remove_wall_between(CellRef::new(chunk, GridPos::new(size - 1, z)), Direction::East);
                    }
                }
                if chunk_z + 1 < chunks.z {
                    for x in 0..size {
                        self.data
                            .remove_wall_between(CellRef::new(chunk, GridPos::new(x, size - 1)), Direction::North);
                    }
                }
            }
        }
    }
}

/// Convenience wrapper: build a carver for `config` and run it.
pub fn generate(config: &MazeConfig) -> Result<MazeData> {
    MazeCarver::new(config.clone())?.generate()
}
