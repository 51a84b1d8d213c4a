// navigation.rs - Discrete car state machine over the carved maze
//
// The car sits on a node, faces one of four directions and runs at most one
// transition at a time. Transitions are advanced by the external tick; a
// command arriving mid-transition is rejected, never queued.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::time::Duration;

use crate::animation::{Heading, Tween, Vec3};
use crate::config::{CarConfig, SpawnPoint};
use crate::error_handling::{MazeError, Result};
use crate::maze::{CellRef, Maze};
use crate::types::{Direction, GridPos, NodeInfo};

/// Result of a user command. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Accepted,
    /// Wall in the way or no cell there.
    Blocked,
    /// A move or turn is still running.
    Busy,
    /// No maze or no car yet.
    NotReady,
}

impl CommandOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandOutcome::Accepted => "accepted",
            CommandOutcome::Blocked => "blocked",
            CommandOutcome::Busy => "busy",
            CommandOutcome::NotReady => "not_ready",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavCommand {
    TurnLeft,
    TurnRight,
    MoveForward,
    MoveBackward,
}

impl NavCommand {
    pub fn name(self) -> &'static str {
        match self {
            NavCommand::TurnLeft => "turn_left",
            NavCommand::TurnRight => "turn_right",
            NavCommand::MoveForward => "move_forward",
            NavCommand::MoveBackward => "move_backward",
        }
    }
}

#[derive(Debug, Clone)]
pub enum NavState {
    Idle,
    Moving { target: NodeInfo, tween: Tween<Vec3> },
    Rotating { target_direction: Direction, tween: Tween<Heading> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavPhase {
    Idle,
    Moving,
    Rotating,
}

impl NavState {
    pub fn phase(&self) -> NavPhase {
        match self {
            NavState::Idle => NavPhase::Idle,
            NavState::Moving { .. } => NavPhase::Moving,
            NavState::Rotating { .. } => NavPhase::Rotating,
        }
    }
}

/// Snapshot reported by the status query.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub chunk: GridPos,
    pub cell: GridPos,
    pub global: GridPos,
    pub direction: &'static str,
    pub direction_index: u8,
    pub state: NavPhase,
    pub target: Option<GridPos>,
    pub position: Vec3,
    pub heading: f32,
}

/// Pick the spawn node for `policy`.
pub fn spawn_node(maze: &Maze, policy: SpawnPoint) -> Result<NodeInfo> {
    let nodes = maze.nodes();
    let node = match policy {
        SpawnPoint::GenerationStart => {
            let data = maze.data();
            let start = data.to_global(data.start_generation_chunk(), data.start_generation_cell());
            nodes.get(start).or_else(|| {
                warn!("No node at generation start {}, using the nearest one", start);
                nodes.nearest(start)
            })
        }
        SpawnPoint::Origin => nodes.get(GridPos::new(0, 0)).or_else(|| {
            warn!("No node at global (0, 0), looking in chunk (0, 0)");
            nodes
                .iter()
                .filter(|n| n.chunk == GridPos::new(0, 0))
                .min_by_key(|n| n.global)
                .or_else(|| nodes.iter().min_by_key(|n| n.global))
        }),
    };
    node.copied().ok_or(MazeError::NotReady("node map is empty"))
}

#[derive(Debug, Clone)]
pub struct Navigator {
    car: CarConfig,
    current: NodeInfo,
    direction: Direction,
    position: Vec3,
    heading: Heading,
    state: NavState,
}

impl Navigator {
    /// Place a car facing forward on the spawn node chosen by `car.spawn`.
    pub fn spawn(maze: &Maze, car: CarConfig) -> Result<Self> {
        let node = spawn_node(maze, car.spawn)?;
        let navigator = Self::at_node(node, car);
        info!(
            "Car spawned at chunk {} cell {} facing {}",
            node.chunk, node.cell, navigator.direction
        );
        Ok(navigator)
    }

    pub fn at_node(node: NodeInfo, car: CarConfig) -> Self {
        let position = node.world + Vec3::up() * car.ride_height;
        Self {
            car,
            current: node,
            direction: Direction::North,
            position,
            heading: Heading::new(Direction::North.heading_degrees()),
            state: NavState::Idle,
        }
    }

    pub fn current_node(&self) -> &NodeInfo {
        &self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, NavState::Idle)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Cell being moved into, only while moving.
    pub fn target(&self) -> Option<GridPos> {
        match &self.state {
            NavState::Moving { target, .. } => Some(target.global),
            _ => None,
        }
    }

    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            chunk: self.current.chunk,
            cell: self.current.cell,
            global: self.current.global,
            direction: self.direction.name(),
            direction_index: self.direction.index(),
            state: self.state.phase(),
            target: self.target(),
            position: self.position,
            heading: self.heading.degrees(),
        }
    }

    pub fn execute(&mut self, maze: &Maze, command: NavCommand) -> Result<CommandOutcome> {
        match command {
            NavCommand::TurnLeft => Ok(self.turn_left()),
            NavCommand::TurnRight => Ok(self.turn_right()),
            NavCommand::MoveForward => self.move_forward(maze),
            NavCommand::MoveBackward => self.move_backward(maze),
        }
    }

    pub fn turn_left(&mut self) -> CommandOutcome {
        self.start_turn(self.direction.turned_left())
    }

    pub fn turn_right(&mut self) -> CommandOutcome {
        self.start_turn(self.direction.turned_right())
    }

    fn start_turn(&mut self, target_direction: Direction) -> CommandOutcome {
        if !self.is_idle() {
            debug!("Turn rejected: transition in progress");
            return CommandOutcome::Busy;
        }

        self.direction = target_direction;
        let tween = Tween::new(
            self.heading,
            Heading::new(target_direction.heading_degrees()),
            self.car.rotation_duration(),
        )
        .with_easing(self.car.easing);
        self.state = NavState::Rotating { target_direction, tween };

        debug!("Turning to {}", target_direction);
        CommandOutcome::Accepted
    }

    pub fn move_forward(&mut self, maze: &Maze) -> Result<CommandOutcome> {
        self.start_move(maze, self.direction)
    }

    pub fn move_backward(&mut self, maze: &Maze) -> Result<CommandOutcome> {
        self.start_move(maze, self.direction.opposite())
    }

    fn start_move(&mut self, maze: &Maze, direction: Direction) -> Result<CommandOutcome> {
        if !self.is_idle() {
            debug!("Move rejected: transition in progress");
            return Ok(CommandOutcome::Busy);
        }

        let target_global = self.current.global + direction.offset();
        let Some(target) = maze.node(target_global).copied() else {
            warn!("Move {} blocked: no cell at {}", direction, target_global);
            return Ok(CommandOutcome::Blocked);
        };
        if !self.can_move_to_direction(maze, direction)? {
            warn!("Move {} blocked by a wall at {}", direction, self.current.global);
            return Ok(CommandOutcome::Blocked);
        }

        let end = target.world + Vec3::up() * self.car.ride_height;
        let duration = self.car.motion.move_duration(self.position.distance(end));
        let tween = Tween::new(self.position, end, duration).with_easing(self.car.easing);
        self.state = NavState::Moving { target, tween };

        debug!("Moving {} to {} over {:?}", direction, target.global, duration);
        Ok(CommandOutcome::Accepted)
    }

    /// True when the neighbor in `direction` exists and no wall separates it.
    ///
    /// The wall is read from both cells' chunks. Disagreement is a generation
    /// defect and comes back as [`MazeError::AsymmetricWall`].
    pub fn can_move_to_direction(&self, maze: &Maze, direction: Direction) -> Result<bool> {
        let from = self.current;
        let Some(to) = maze.node(from.global + direction.offset()) else {
            return Ok(false);
        };

        let from_sees_wall = maze.data().has_wall(CellRef::new(from.chunk, from.cell), direction);
        let to_sees_wall = maze.data().has_wall(CellRef::new(to.chunk, to.cell), direction.opposite());

        if from_sees_wall != to_sees_wall {
            error!(
                "Asymmetric wall between {} and {}: {} vs {}",
                from.global, to.global, from_sees_wall, to_sees_wall
            );
            return Err(MazeError::AsymmetricWall {
                from: from.global,
                to: to.global,
                from_sees_wall,
                to_sees_wall,
            });
        }
        Ok(!from_sees_wall)
    }

    /// Advance the running transition by `dt`. Returns true when one finished.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let finished = match &mut self.state {
            NavState::Idle => return false,
            NavState::Moving { target, tween } => {
                let running = tween.update(dt);
                self.position = *tween.current();
                if running {
                    return false;
                }
                self.current = *target;
                debug!("Arrived at chunk {} cell {}", target.chunk, target.cell);
                true
            }
            NavState::Rotating { target_direction, tween } => {
                let running = tween.update(dt);
                self.heading = *tween.current();
                if running {
                    return false;
                }
                debug!("Now facing {}", target_direction);
                true
            }
        };

        if finished {
            self.state = NavState::Idle;
        }
        finished
    }

    /// Jump to `global` unconditionally, cancelling any transition.
    pub fn teleport(&mut self, maze: &Maze, global: GridPos) -> Result<()> {
        let node = *maze.node(global).ok_or(MazeError::NodeNotFound(global))?;
        self.current = node;
        self.position = node.world + Vec3::up() * self.car.ride_height;
        self.heading = Heading::new(self.direction.heading_degrees());
        self.state = NavState::Idle;
        info!("Car teleported to chunk {} cell {}", node.chunk, node.cell);
        Ok(())
    }

    /// Face `direction` immediately. Ignored mid-transition.
    pub fn face(&mut self, direction: Direction) {
        if self.is_idle() {
            self.direction = direction;
            self.heading = Heading::new(direction.heading_degrees());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, MazeConfig, MotionProfile};

    fn maze(seed: u64) -> Maze {
        let config = MazeConfig {
            chunk_size: 4,
            size_in_chunks: GridPos::new(2, 2),
            seed: Some(seed),
            ..MazeConfig::default()
        };
        Maze::generate(&config, LayoutConfig::default()).unwrap()
    }

    fn car() -> CarConfig {
        CarConfig {
            motion: MotionProfile::Fixed { duration_ms: 100 },
            rotation_duration_ms: 100,
            ..CarConfig::default()
        }
    }

    fn open_and_closed(maze: &Maze, nav: &Navigator) -> (Option<Direction>, Option<Direction>) {
        let at = CellRef::new(nav.current_node().chunk, nav.current_node().cell);
        let open = Direction::ALL.into_iter().find(|&d| {
            maze.data().neighbor(at, d).is_some() && !maze.data().has_wall(at, d)
        });
        let closed = Direction::ALL.into_iter().find(|&d| maze.data().has_wall(at, d));
        (open, closed)
    }

    #[test]
    fn test_spawns_at_generation_start() {
        let maze = maze(1);
        let nav = Navigator::spawn(&maze, car()).unwrap();
        assert_eq!(nav.current_node().global, GridPos::new(6, 6));
        assert_eq!(nav.direction(), Direction::North);
        assert!((nav.position().y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_origin_spawn_policy() {
        let maze = maze(1);
        let node = spawn_node(&maze, SpawnPoint::Origin).unwrap();
        assert_eq!(node.global, GridPos::new(0, 0));
    }

    #[test]
    fn test_two_right_turns_face_backward() {
        let mut nav = Navigator::spawn(&maze(2), car()).unwrap();

        assert_eq!(nav.turn_right(), CommandOutcome::Accepted);
        assert_eq!(nav.state().phase(), NavPhase::Rotating);
        assert_eq!(nav.turn_right(), CommandOutcome::Busy);
        assert!(!nav.advance(Duration::from_millis(50)));
        assert!((nav.heading().degrees() - 45.0).abs() < 0.01);
        assert!(nav.advance(Duration::from_millis(50)));
        assert!(nav.is_idle());

        assert_eq!(nav.turn_right(), CommandOutcome::Accepted);
        nav.advance(Duration::from_millis(100));
        assert!(nav.is_idle());
        assert_eq!(nav.direction(), Direction::South);
        assert_eq!(nav.direction().index(), 2);
        assert_eq!(nav.heading().degrees(), 180.0);
    }

    #[test]
    fn test_left_turn_from_forward_takes_short_arc() {
        let mut nav = Navigator::spawn(&maze(2), car()).unwrap();
        nav.turn_left();
        nav.advance(Duration::from_millis(50));
        assert!((nav.heading().degrees() - 315.0).abs() < 0.01);
        nav.advance(Duration::from_millis(50));
        assert_eq!(nav.direction(), Direction::West);
    }

    #[test]
    fn test_move_through_open_wall() {
        let maze = maze(3);
        let mut nav = Navigator::spawn(&maze, car()).unwrap();
        let (open, _) = open_and_closed(&maze, &nav);
        let open = open.unwrap();
        nav.face(open);

        let start = nav.current_node().global;
        assert!(nav.can_move_to_direction(&maze, open).unwrap());
        assert_eq!(nav.move_forward(&maze).unwrap(), CommandOutcome::Accepted);
        assert_eq!(nav.target(), Some(start + open.offset()));
        assert_eq!(nav.move_forward(&maze).unwrap(), CommandOutcome::Busy);

        assert!(nav.advance(Duration::from_millis(100)));
        assert_eq!(nav.current_node().global, start + open.offset());
        assert!(nav.is_idle());
        assert_eq!(nav.target(), None);
    }

    #[test]
    fn test_blocked_move_leaves_state_unchanged() {
        let maze = maze(4);
        let mut nav = Navigator::spawn(&maze, car()).unwrap();
        let (_, closed) = open_and_closed(&maze, &nav);
        let closed = closed.unwrap();
        nav.face(closed.opposite());

        let before = nav.current_node().global;
        assert_eq!(nav.move_backward(&maze).unwrap(), CommandOutcome::Blocked);
        assert_eq!(nav.current_node().global, before);
        assert!(nav.is_idle());
    }

    #[test]
    fn test_edge_of_maze_is_blocked() {
        let maze = maze(5);
        let mut nav = Navigator::spawn(&maze, car()).unwrap();
        nav.teleport(&maze, GridPos::new(0, 0)).unwrap();
        nav.face(Direction::West);
        assert!(!nav.can_move_to_direction(&maze, Direction::West).unwrap());
        assert_eq!(nav.move_forward(&maze).unwrap(), CommandOutcome::Blocked);
    }

    #[test]
    fn test_teleport_cancels_move() {
        let maze = maze(6);
        let mut nav = Navigator::spawn(&maze, car()).unwrap();
        let (open, _) = open_and_closed(&maze, &nav);
        nav.face(open.unwrap());
        assert_eq!(nav.move_forward(&maze).unwrap(), CommandOutcome::Accepted);
        nav.advance(Duration::from_millis(30));

        nav.teleport(&maze, GridPos::new(7, 0)).unwrap();
        assert!(nav.is_idle());
        assert_eq!(nav.current_node().global, GridPos::new(7, 0));
        assert_eq!(nav.position(), maze.node(GridPos::new(7, 0)).unwrap().world + Vec3::up() * 0.5);

        assert!(matches!(
            nav.teleport(&maze, GridPos::new(8, 0)),
            Err(MazeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_asymmetric_wall_is_surfaced() {
        let config = MazeConfig {
            chunk_size: 2,
            size_in_chunks: GridPos::new(2, 1),
            ..MazeConfig::default()
        };
        let mut data = crate::maze::MazeData::from_config(&config).unwrap();
        // Clear only the left chunk's copy of the seam at row 0
        data.chunk_mut(GridPos::new(0, 0)).unwrap().remove_vertical_wall(2, 0);
        let maze = Maze::index(data, LayoutConfig::default(), 0).unwrap();

        let node = *maze.node(GridPos::new(1, 0)).unwrap();
        let mut nav = Navigator::at_node(node, car());
        nav.face(Direction::East);

        assert!(matches!(
            nav.can_move_to_direction(&maze, Direction::East),
            Err(MazeError::AsymmetricWall { from_sees_wall: false, to_sees_wall: true, .. })
        ));
        assert!(nav.move_forward(&maze).is_err());
        assert!(nav.is_idle());
    }
}
