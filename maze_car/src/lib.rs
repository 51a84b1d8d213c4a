// lib.rs - Library exports for maze-car-sim
// Chunked maze generation, car navigation, simulated lidar and the control API

pub mod animation;
pub mod config;
pub mod error_handling;
pub mod http_server;
pub mod lidar;
pub mod maze;
pub mod navigation;
pub mod simulation;
pub mod types;

// Re-export commonly used types
pub use config::{CarConfig, LayoutConfig, MazeConfig, MotionProfile, SimulationConfig, SpawnPoint};
pub use error_handling::{MazeError, Result};
pub use lidar::{LidarPointConfig, RaycastProvider, SensorModel, WallGridRaycaster};
pub use maze::{Maze, MazeCarver, MazeData, NodeMap};
pub use navigation::{CommandOutcome, NavCommand, NavState, Navigator};
pub use simulation::{InitPhase, Simulation};
pub use types::{Direction, GridPos, NodeInfo};
