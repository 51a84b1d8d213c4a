// config.rs - Immutable simulation configuration
//
// Every field has a default so a partial JSON file is enough. Changing a maze
// parameter means building a new simulation; nothing here is mutated in place.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::animation::{Easing, Vec3};
use crate::error_handling::{MazeError, Result};
use crate::lidar::LidarPointConfig;
use crate::types::GridPos;

pub const MIN_CHUNK_SIZE: i32 = 2;
pub const MIN_CHUNKS_PER_AXIS: i32 = 1;
/// Largest maze accepted, in cells.
pub const MAX_TOTAL_CELLS: i64 = 1 << 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub maze: MazeConfig,
    pub layout: LayoutConfig,
    pub car: CarConfig,
    pub lidar: Vec<LidarPointConfig>,
    pub server: ServerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            maze: MazeConfig::default(),
            layout: LayoutConfig::default(),
            car: CarConfig::default(),
            lidar: vec![LidarPointConfig::default()],
            server: ServerConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON document; missing sections fall back to defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.maze.validate()?;
        self.layout.validate()?;
        self.car.validate()?;
        for point in &self.lidar {
            point.validate()?;
        }
        Ok(())
    }
}

/// Generation-time parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    /// Cells per chunk edge.
    pub chunk_size: i32,
    /// Chunks along X (`x`) and Z (`z`).
    pub size_in_chunks: GridPos,
    /// Only fixes the pre-shuffle direction order.
    pub use_right_hand_rule: bool,
    pub create_finish_area: bool,
    pub seed: Option<u64>,
    /// Reject a generated maze that fails the symmetry or connectivity audit.
    pub strict_validation: bool,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4,
            size_in_chunks: GridPos::new(3, 3),
            use_right_hand_rule: true,
            create_finish_area: true,
            seed: None,
            strict_validation: true,
        }
    }
}

impl MazeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(MazeError::InvalidConfig {
                reason: format!("chunk_size must be at least {MIN_CHUNK_SIZE}, got {}", self.chunk_size),
            });
        }
        if self.size_in_chunks.x < MIN_CHUNKS_PER_AXIS || self.size_in_chunks.z < MIN_CHUNKS_PER_AXIS {
            return Err(MazeError::InvalidConfig {
                reason: format!(
                    "size_in_chunks must be at least 1x1, got {}x{}",
                    self.size_in_chunks.x, self.size_in_chunks.z
                ),
            });
        }

        let cells = self.total_cells_wide();
        if cells > MAX_TOTAL_CELLS {
            return Err(MazeError::InvalidConfig {
                reason: format!(
                    "maze of {}x{} chunks of {} cells exceeds {MAX_TOTAL_CELLS} cells",
                    self.size_in_chunks.x, self.size_in_chunks.z, self.chunk_size
                ),
            });
        }
        Ok(())
    }

    // Saturates at i64::MAX.
    fn total_cells_wide(&self) -> i64 {
        let x = i64::from(self.size_in_chunks.x.max(0)) * i64::from(self.chunk_size.max(0));
        let z = i64::from(self.size_in_chunks.z.max(0)) * i64::from(self.chunk_size.max(0));
        x.checked_mul(z).unwrap_or(i64::MAX)
    }

    pub fn total_cells(&self) -> usize {
        usize::try_from(self.total_cells_wide()).unwrap_or(usize::MAX)
    }
}

/// World-space placement of cells, used by the node map and the raycaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub cell_size: f32,
    pub chunk_offset: Vec3,
    pub cell_offset: Vec3,
    pub wall_offset: Vec3,
    pub wall_height: f32,
    pub wall_thickness: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            chunk_offset: Vec3::zero(),
            cell_offset: Vec3::zero(),
            wall_offset: Vec3::zero(),
            wall_height: 3.0,
            wall_thickness: 0.1,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(MazeError::InvalidConfig {
                reason: format!("cell_size must be positive, got {}", self.cell_size),
            });
        }
        Ok(())
    }
}

/// How long a one-cell move takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionProfile {
    /// Duration is `distance / units_per_second`.
    Speed { units_per_second: f32 },
    /// Every move takes the same time regardless of distance.
    Fixed { duration_ms: u64 },
}

impl MotionProfile {
    pub fn move_duration(self, distance: f32) -> Duration {
        match self {
            MotionProfile::Speed { units_per_second } => {
                Duration::from_secs_f32((distance / units_per_second).max(0.0))
            }
            MotionProfile::Fixed { duration_ms } => Duration::from_millis(duration_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPoint {
    /// The generation-start cell, or the nearest node to it.
    #[default]
    GenerationStart,
    /// Global cell (0, 0), else any node of chunk (0, 0), else any node.
    Origin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    pub motion: MotionProfile,
    pub rotation_duration_ms: u64,
    pub easing: Easing,
    /// Height of the car above the node position.
    pub ride_height: f32,
    pub spawn: SpawnPoint,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            motion: MotionProfile::Speed { units_per_second: 5.0 },
            rotation_duration_ms: 500,
            easing: Easing::Linear,
            ride_height: 0.5,
            spawn: SpawnPoint::GenerationStart,
        }
    }
}

impl CarConfig {
    pub fn validate(&self) -> Result<()> {
        if let MotionProfile::Speed { units_per_second } = self.motion {
            if !(units_per_second.is_finite() && units_per_second > 0.0) {
                return Err(MazeError::InvalidConfig {
                    reason: format!("move speed must be positive, got {units_per_second}"),
                });
            }
        }
        Ok(())
    }

    pub fn rotation_duration(&self) -> Duration {
        Duration::from_millis(self.rotation_duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub tick_hz: u32,
    pub bind_retry_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            tick_hz: 60,
            bind_retry_delay_ms: 1000,
        }
    }
}

impl ServerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}
