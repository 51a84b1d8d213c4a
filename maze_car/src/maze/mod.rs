// maze/mod.rs - Chunked maze storage, generation and indexing

pub mod analysis;
pub mod carver;
pub mod chunk;
pub mod data;
pub mod layout;
pub mod node_map;

pub use carver::MazeCarver;
pub use chunk::MazeChunk;
pub use data::{CellRef, MazeData};
pub use layout::MazeLayout;
pub use node_map::NodeMap;

use uuid::Uuid;

use crate::config::{LayoutConfig, MazeConfig};
use crate::error_handling::Result;
use crate::types::{GridPos, NodeInfo};

/// A carved maze together with its node index. Immutable once built;
/// regenerating produces a new `Maze` with a new id.
#[derive(Debug, Clone)]
pub struct Maze {
    id: Uuid,
    seed: u64,
    data: MazeData,
    nodes: NodeMap,
    layout: MazeLayout,
}

impl Maze {
    /// Carve and index in one go.
    pub fn generate(config: &MazeConfig, layout: LayoutConfig) -> Result<Self> {
        let carver = MazeCarver::new(config.clone())?;
        let seed = carver.seed();
        let data = carver.generate()?;
        Self::index(data, layout, seed)
    }

    /// Build the node map for already carved `data`.
    pub fn index(data: MazeData, layout: LayoutConfig, seed: u64) -> Result<Self> {
        let layout = MazeLayout::new(layout, data.chunk_size(), data.size_in_chunks());
        let nodes = NodeMap::build(&data, &layout)?;
        Ok(Self {
            id: Uuid::new_v4(),
            seed,
            data,
            nodes,
            layout,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn data(&self) -> &MazeData {
        &self.data
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn layout(&self) -> &MazeLayout {
        &self.layout
    }

    #[inline]
    pub fn node(&self, global: GridPos) -> Option<&NodeInfo> {
        self.nodes.get(global)
    }
}
