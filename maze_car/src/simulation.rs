// simulation.rs - Owns one maze, one car and its sensors
//
// Built in four phases (generate, index, spawn, ready). Nothing is mutated
// across regenerations: a new maze means a new `Simulation`.

use log::info;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::animation::Vec3;
use crate::config::{MazeConfig, SimulationConfig};
use crate::error_handling::Result;
use crate::lidar::{LidarReport, SensorModel, WallGridRaycaster};
use crate::maze::{Maze, MazeCarver};
use crate::navigation::{AgentStatus, CommandOutcome, NavCommand, Navigator};
use crate::types::{Direction, GridPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPhase {
    Generated,
    Indexed,
    AgentSpawned,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
pub struct MazeSummary {
    pub id: Uuid,
    pub seed: u64,
    pub chunk_size: i32,
    pub size_in_chunks: GridPos,
    pub total_cells_x: i32,
    pub total_cells_z: i32,
    pub total_width: f32,
    pub total_depth: f32,
    pub start_chunk: GridPos,
    pub start_cell: GridPos,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationStatus {
    pub maze: MazeSummary,
    pub car: AgentStatus,
}

pub struct Simulation {
    config: SimulationConfig,
    maze: Maze,
    navigator: Navigator,
    sensors: SensorModel,
    raycaster: WallGridRaycaster,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_phases(config, |_| {})
    }

    /// Build a simulation, reporting each finished phase to `on_phase`.
    pub fn with_phases(config: SimulationConfig, mut on_phase: impl FnMut(InitPhase)) -> Result<Self> {
        config.validate()?;

        let carver = MazeCarver::new(config.maze.clone())?;
        let seed = carver.seed();
        let data = carver.generate()?;
        on_phase(InitPhase::Generated);

        let maze = Maze::index(data, config.layout.clone(), seed)?;
        on_phase(InitPhase::Indexed);

        let navigator = Navigator::spawn(&maze, config.car.clone())?;
        on_phase(InitPhase::AgentSpawned);

        let sensors = SensorModel::new(&config.lidar);
        let raycaster = WallGridRaycaster::new(&maze);
        on_phase(InitPhase::Ready);

        info!("Simulation ready (maze {})", maze.id());
        Ok(Self { config, maze, navigator, sensors, raycaster })
    }

    /// A fresh simulation with the same settings, optionally replacing the
    /// maze parameters.
    pub fn regenerate(&self, maze: Option<MazeConfig>) -> Result<Self> {
        let mut config = self.config.clone();
        if let Some(maze) = maze {
            config.maze = maze;
        }
        Self::new(config)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn sensors(&self) -> &SensorModel {
        &self.sensors
    }

    pub fn execute(&mut self, command: NavCommand) -> Result<CommandOutcome> {
        let outcome = self.navigator.execute(&self.maze, command)?;
        info!("{} -> {}", command.name(), outcome.as_str());
        Ok(outcome)
    }

    pub fn advance(&mut self, dt: Duration) -> bool {
        self.navigator.advance(dt)
    }

    pub fn teleport(&mut self, global: GridPos) -> Result<()> {
        self.navigator.teleport(&self.maze, global)
    }

    /// Cell the car is sent to on restart: the generation chunk, two cells
    /// back from the start cell on each axis.
    pub fn restart_cell(&self) -> GridPos {
        let data = self.maze.data();
        let start = data.start_generation_cell();
        let cell = GridPos::new((start.x - 2).max(0), (start.z - 2).max(0));
        data.to_global(data.start_generation_chunk(), cell)
    }

    /// Teleport to the restart cell and face forward.
    pub fn restart(&mut self) -> Result<()> {
        let target = self.restart_cell();
        self.navigator.teleport(&self.maze, target)?;
        self.navigator.face(Direction::North);
        info!("Car restarted at {}", target);
        Ok(())
    }

    /// Sample every lidar point at the car's current pose.
    pub fn scan_lidar(&mut self) -> Result<()> {
        let position = self.navigator.position();
        let heading = self.navigator.heading();
        self.sensors.scan(&self.raycaster, position, heading)
    }

    pub fn lidar_report(&self) -> LidarReport {
        self.sensors.report()
    }

    pub fn summary(&self) -> MazeSummary {
        let data = self.maze.data();
        let layout = self.maze.layout();
        MazeSummary {
            id: self.maze.id(),
            seed: self.maze.seed(),
            chunk_size: data.chunk_size(),
            size_in_chunks: data.size_in_chunks(),
            total_cells_x: data.total_cells_x(),
            total_cells_z: data.total_cells_z(),
            total_width: layout.total_width(),
            total_depth: layout.total_depth(),
            start_chunk: data.start_generation_chunk(),
            start_cell: data.start_generation_cell(),
        }
    }

    pub fn status(&self) -> SimulationStatus {
        SimulationStatus { maze: self.summary(), car: self.navigator.status() }
    }

    pub fn car_position(&self) -> Vec3 {
        self.navigator.position()
    }
}
