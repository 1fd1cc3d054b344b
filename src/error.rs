use thiserror::Error;

use crate::grid::Cell;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("invalid grid dimensions {width}x{height}: both must be at least 1")]
    InvalidDimensions { width: usize, height: usize },

    #[error("wall group size must be at least 1")]
    InvalidGroupSize,

    #[error("cell size must be at least 1 pixel")]
    InvalidCellSize,

    #[error("tick interval must be at least 1 ms")]
    InvalidTickInterval,

    #[error("canvas for a {width}x{height} maze is too large at these pixel sizes")]
    InvalidCanvas { width: usize, height: usize },

    #[error("cells {a} and {b} are not adjacent")]
    InvalidAdjacency { a: Cell, b: Cell },

    #[error("wall between {a} and {b} was already removed")]
    WallAlreadyRemoved { a: Cell, b: Cell },

    #[error("generator already complete")]
    GeneratorAlreadyComplete,

    #[error("random choice from an empty set")]
    EmptyChoice,
}

pub type Result<T> = std::result::Result<T, MazeError>;
