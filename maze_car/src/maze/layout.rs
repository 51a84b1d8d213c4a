// maze/layout.rs - Cell to world-space mapping

use crate::animation::Vec3;
use crate::config::LayoutConfig;
use crate::types::GridPos;

/// Pure placement function shared by the node map, the raycaster and any
/// renderer consuming the wall arrays.
#[derive(Debug, Clone)]
pub struct MazeLayout {
    config: LayoutConfig,
    chunk_size: i32,
    size_in_chunks: GridPos,
}

impl MazeLayout {
    pub fn new(config: LayoutConfig, chunk_size: i32, size_in_chunks: GridPos) -> Self {
        Self { config, chunk_size, size_in_chunks }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    /// `chunk * (chunk_size * cell_size + chunk_offset) + cell * (cell_size + cell_offset) + wall_offset`,
    /// with the height taken from `wall_offset.y`.
    pub fn world_position(&self, chunk: GridPos, cell: GridPos) -> Vec3 {
        let c = &self.config;
        let chunk_span = self.chunk_size as f32 * c.cell_size;

        let x = chunk.x as f32 * (chunk_span + c.chunk_offset.x)
            + cell.x as f32 * (c.cell_size + c.cell_offset.x)
            + c.wall_offset.x;
        let z = chunk.z as f32 * (chunk_span + c.chunk_offset.z)
            + cell.z as f32 * (c.cell_size + c.cell_offset.z)
            + c.wall_offset.z;

        Vec3::new(x, c.wall_offset.y, z)
    }

    /// World extent along X.
    pub fn total_width(&self) -> f32 {
        let cells = (self.size_in_chunks.x * self.chunk_size) as f32;
        cells * self.config.cell_size + (self.size_in_chunks.x - 1).max(0) as f32 * self.config.chunk_offset.x
    }

    /// World extent along Z.
    pub fn total_depth(&self) -> f32 {
        let cells = (self.size_in_chunks.z * self.chunk_size) as f32;
        cells * self.config.cell_size + (self.size_in_chunks.z - 1).max(0) as f32 * self.config.chunk_offset.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_a_regular_grid() {
        let layout = MazeLayout::new(LayoutConfig::default(), 4, GridPos::new(2, 2));
        let p = layout.world_position(GridPos::new(1, 0), GridPos::new(2, 3));
        // (4 * 2 + 2 * 2, 0, 3 * 2)
        assert_eq!(p, Vec3::new(12.0, 0.0, 6.0));
        assert_eq!(layout.total_width(), 16.0);
        assert_eq!(layout.total_depth(), 16.0);
    }

    #[test]
    fn test_offsets_are_applied() {
        let config = LayoutConfig {
            cell_size: 1.0,
            chunk_offset: Vec3::new(0.5, 0.0, 1.0),
            cell_offset: Vec3::new(0.1, 0.0, 0.0),
            wall_offset: Vec3::new(0.0, 0.25, -1.0),
            ..LayoutConfig::default()
        };
        let layout = MazeLayout::new(config, 3, GridPos::new(3, 2));
        let p = layout.world_position(GridPos::new(2, 1), GridPos::new(1, 0));
        assert!((p.x - (2.0 * 3.5 + 1.1)).abs() < 1e-5);
        assert!((p.y - 0.25).abs() < 1e-6);
        assert!((p.z - (1.0 * 4.0 - 1.0)).abs() < 1e-5);
        assert!((layout.total_width() - 10.0).abs() < 1e-5);
        assert!((layout.total_depth() - 7.0).abs() < 1e-5);
    }
}
