// maze/node_map.rs - Global cell -> node lookup built once after carving

use log::{debug, error};
use std::collections::HashMap;

use crate::error_handling::{MazeError, Result};
use crate::types::{GridPos, NodeInfo};

use super::data::MazeData;
use super::layout::MazeLayout;

#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    nodes: HashMap<GridPos, NodeInfo>,
}

impl NodeMap {
    /// One node per cell of `data`, positioned with `layout`.
    pub fn build(data: &MazeData, layout: &MazeLayout) -> Result<Self> {
        let nodes = data.cells().map(|at| NodeInfo {
            chunk: at.chunk,
            cell: at.cell,
            global: data.to_global(at.chunk, at.cell),
            world: layout.world_position(at.chunk, at.cell),
        });
        let map = Self::from_nodes(nodes, data.total_cells())?;
        debug!("Node map built with {} nodes", map.len());
        Ok(map)
    }

    /// Insert `nodes`, rejecting duplicate keys and a final count other than `expected`.
    pub fn from_nodes(nodes: impl IntoIterator<Item = NodeInfo>, expected: usize) -> Result<Self> {
        let mut map = HashMap::with_capacity(expected);
        for node in nodes {
            if map.insert(node.global, node).is_some() {
                error!("Duplicate node for global cell {}", node.global);
                return Err(MazeError::DuplicateNode(node.global));
            }
        }

        if map.len() != expected {
            error!("Node map holds {} nodes, expected {}", map.len(), expected);
            return Err(MazeError::NodeCountMismatch { expected, actual: map.len() });
        }

        Ok(Self { nodes: map })
    }

    /// `None` means there is no cell there, which is normal at the maze edge.
    #[inline]
    pub fn get(&self, global: GridPos) -> Option<&NodeInfo> {
        self.nodes.get(&global)
    }

    pub fn contains(&self, global: GridPos) -> bool {
        self.nodes.contains_key(&global)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }

    /// Closest node to `target` by Manhattan distance; ties go to the lowest
    /// global x, then z.
    pub fn nearest(&self, target: GridPos) -> Option<&NodeInfo> {
        self.nodes
            .values()
            .min_by_key(|node| (node.global.manhattan(target), node.global.x, node.global.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Vec3;
    use crate::config::LayoutConfig;

    fn node(x: i32, z: i32) -> NodeInfo {
        NodeInfo {
            chunk: GridPos::new(0, 0),
            cell: GridPos::new(x, z),
            global: GridPos::new(x, z),
            world: Vec3::zero(),
        }
    }

    #[test]
    fn test_build_covers_every_cell() {
        let data = MazeData::new(3, GridPos::new(2, 2));
        let layout = MazeLayout::new(LayoutConfig::default(), 3, GridPos::new(2, 2));
        let map = NodeMap::build(&data, &layout).unwrap();

        assert_eq!(map.len(), 36);
        let node = map.get(GridPos::new(4, 1)).unwrap();
        assert_eq!(node.chunk, GridPos::new(1, 0));
        assert_eq!(node.cell, GridPos::new(1, 1));
        assert_eq!(node.world, Vec3::new(8.0, 0.0, 2.0));
        assert!(map.get(GridPos::new(6, 0)).is_none());
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let result = NodeMap::from_nodes([node(0, 0), node(1, 0), node(0, 0)], 3);
        assert!(matches!(result, Err(MazeError::DuplicateNode(p)) if p == GridPos::new(0, 0)));
    }

    #[test]
    fn test_count_mismatch_is_rejected() {
        let result = NodeMap::from_nodes([node(0, 0), node(1, 0)], 4);
        assert!(matches!(
            result,
            Err(MazeError::NodeCountMismatch { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_nearest_breaks_ties_by_x_then_z() {
        let map = NodeMap::from_nodes([node(2, 1), node(1, 2), node(0, 3)], 3).unwrap();
        // (1, 1) is one step from both (2, 1) and (1, 2)
        assert_eq!(map.nearest(GridPos::new(1, 1)).unwrap().global, GridPos::new(1, 2));
        assert_eq!(map.nearest(GridPos::new(0, 5)).unwrap().global, GridPos::new(0, 3));
        assert!(NodeMap::default().nearest(GridPos::new(0, 0)).is_none());
    }
}
