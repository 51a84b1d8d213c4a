// error_handling.rs - Error taxonomy for generation, navigation and sensing

use thiserror::Error;

use crate::types::GridPos;

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Maze is not ready: {0}")]
    NotReady(&'static str),

    #[error("No node at global cell {0}")]
    NodeNotFound(GridPos),

    #[error("Node map holds {actual} nodes but the maze has {expected} cells")]
    NodeCountMismatch { expected: usize, actual: usize },

    #[error("Duplicate node for global cell {0}")]
    DuplicateNode(GridPos),

    #[error(
        "Asymmetric wall between {from} and {to}: {from} reports wall={from_sees_wall}, \
         {to} reports wall={to_sees_wall}"
    )]
    AsymmetricWall {
        from: GridPos,
        to: GridPos,
        from_sees_wall: bool,
        to_sees_wall: bool,
    },

    #[error("Maze is disconnected: {reachable} of {total} cells reachable")]
    Disconnected { reachable: usize, total: usize },

    #[error("Raycast provider failed: {0}")]
    Raycast(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Command queue closed")]
    QueueClosed,

    #[error("Tick task sent the wrong reply to {0}")]
    UnexpectedReply(&'static str),

    #[error("Failed to bind control API on {addr}: {message}")]
    Bind { addr: String, message: String },
}

impl MazeError {
    /// True for defects that mean the carver or the repair pass broke a
    /// postcondition, as opposed to caller mistakes or I/O trouble.
    pub fn is_consistency_defect(&self) -> bool {
        matches!(
            self,
            MazeError::NodeCountMismatch { .. }
                | MazeError::DuplicateNode(_)
                | MazeError::AsymmetricWall { .. }
                | MazeError::Disconnected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MazeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_classification() {
        let defect = MazeError::AsymmetricWall {
            from: GridPos::new(3, 0),
            to: GridPos::new(4, 0),
            from_sees_wall: false,
            to_sees_wall: true,
        };
        assert!(defect.is_consistency_defect());
        assert!(MazeError::Disconnected { reachable: 3, total: 4 }.is_consistency_defect());

        assert!(!MazeError::NotReady("node map empty").is_consistency_defect());
        assert!(!MazeError::NodeNotFound(GridPos::new(-1, 0)).is_consistency_defect());
    }

    #[test]
    fn test_error_messages_name_cells() {
        let err = MazeError::NodeCountMismatch { expected: 16, actual: 15 };
        assert_eq!(err.to_string(), "Node map holds 15 nodes but the maze has 16 cells");

        let err = MazeError::NodeNotFound(GridPos::new(2, -1));
        assert_eq!(err.to_string(), "No node at global cell (2, -1)");
    }
}
