// tests/navigation_properties.rs - The car only ever moves through open walls

use std::time::Duration;

use maze_car_sim::config::{CarConfig, LayoutConfig, MotionProfile};
use maze_car_sim::maze::CellRef;
use maze_car_sim::navigation::NavPhase;
use maze_car_sim::{CommandOutcome, Direction, GridPos, Maze, MazeConfig, NavCommand, Navigator};
use proptest::prelude::*;

const TICK: Duration = Duration::from_millis(100);

fn car() -> CarConfig {
    CarConfig {
        motion: MotionProfile::Fixed { duration_ms: 40 },
        rotation_duration_ms: 40,
        ..CarConfig::default()
    }
}

fn maze(seed: u64) -> Maze {
    let config = MazeConfig { chunk_size: 4, size_in_chunks: GridPos::new(2, 2), seed: Some(seed), ..MazeConfig::default() };
    Maze::generate(&config, LayoutConfig::default()).unwrap()
}

fn command() -> impl Strategy<Value = NavCommand> {
    prop_oneof![
        Just(NavCommand::TurnLeft),
        Just(NavCommand::TurnRight),
        Just(NavCommand::MoveForward),
        Just(NavCommand::MoveBackward),
    ]
}

fn settle(navigator: &mut Navigator) {
    while !navigator.is_idle() {
        navigator.advance(TICK);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn accepted_moves_cross_open_walls_only(seed in any::<u64>(), commands in prop::collection::vec(command(), 1..60)) {
        let maze = maze(seed);
        let mut navigator = Navigator::spawn(&maze, car()).unwrap();

        for command in commands {
            let before = *navigator.current_node();
            let facing = navigator.direction();
            let outcome = navigator.execute(&maze, command).unwrap();
            settle(&mut navigator);
            let after = *navigator.current_node();

            let moved = match command {
                NavCommand::MoveForward => Some(facing),
                NavCommand::MoveBackward => Some(facing.opposite()),
                _ => None,
            };

            match (moved, outcome) {
                (Some(direction), CommandOutcome::Accepted) => {
                    prop_assert_eq!(after.global, before.global + direction.offset());
                    prop_assert!(!maze.data().has_wall(CellRef::new(before.chunk, before.cell), direction));
                }
                (Some(direction), CommandOutcome::Blocked) => {
                    prop_assert_eq!(after.global, before.global);
                    prop_assert!(maze.data().has_wall(CellRef::new(before.chunk, before.cell), direction));
                }
                (None, outcome) => {
                    prop_assert_eq!(outcome, CommandOutcome::Accepted);
                    prop_assert_eq!(after.global, before.global);
                }
                (Some(_), other) => prop_assert!(false, "unexpected outcome {:?}", other),
            }
            // Moves never change the facing direction
            if moved.is_some() {
                prop_assert_eq!(navigator.direction(), facing);
            }
        }
    }

    #[test]
    fn turns_compose_modulo_four(turns in prop::collection::vec(any::<bool>(), 0..24)) {
        let maze = maze(5);
        let mut navigator = Navigator::spawn(&maze, car()).unwrap();
        let mut net = 0i32;

        for right in turns {
            let command = if right { NavCommand::TurnRight } else { NavCommand::TurnLeft };
            prop_assert_eq!(navigator.execute(&maze, command).unwrap(), CommandOutcome::Accepted);
            settle(&mut navigator);
            net += if right { 1 } else { -1 };
        }

        let expected = Direction::from_index(net.rem_euclid(4) as u8);
        prop_assert_eq!(navigator.direction(), expected);
        prop_assert!((navigator.heading().degrees() - expected.heading_degrees()).abs() < 1e-3);
    }

    #[test]
    fn teleport_ignores_walls(seed in any::<u64>(), x in 0..8i32, z in 0..8i32) {
        let maze = maze(seed);
        let mut navigator = Navigator::spawn(&maze, car()).unwrap();
        navigator.execute(&maze, NavCommand::TurnRight).unwrap();

        navigator.teleport(&maze, GridPos::new(x, z)).unwrap();
        let status = navigator.status();
        prop_assert_eq!(status.global, GridPos::new(x, z));
        prop_assert_eq!(status.state, NavPhase::Idle);
    }
}

#[test]
fn second_command_while_moving_is_busy() {
    let maze = maze(21);
    let mut navigator = Navigator::spawn(&maze, car()).unwrap();

    let open = Direction::ALL
        .into_iter()
        .find(|d| navigator.can_move_to_direction(&maze, *d).unwrap())
        .expect("spawn cell has an exit");
    navigator.face(open);

    assert_eq!(navigator.move_forward(&maze).unwrap(), CommandOutcome::Accepted);
    assert_eq!(navigator.turn_left(), CommandOutcome::Busy);
    assert_eq!(navigator.move_backward(&maze).unwrap(), CommandOutcome::Busy);

    navigator.advance(Duration::from_millis(10));
    assert_eq!(navigator.status().state, NavPhase::Moving);
    settle(&mut navigator);
    assert_eq!(navigator.direction(), open);
    assert_eq!(navigator.move_backward(&maze).unwrap(), CommandOutcome::Accepted);
}

#[test]
fn teleport_outside_the_maze_fails() {
    let maze = maze(2);
    let mut navigator = Navigator::spawn(&maze, car()).unwrap();
    assert!(navigator.teleport(&maze, GridPos::new(8, 0)).is_err());
    assert!(navigator.teleport(&maze, GridPos::new(-1, 3)).is_err());
}
