use thiserror::Error;

use crate::board::Position;

pub type Result<T> = std::result::Result<T, SnakeError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnakeError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("position ({}, {}) is outside the {columns}x{rows} board", .position.x, .position.y)]
    OutOfBounds {
        position: Position,
        rows: usize,
        columns: usize,
    },

    /// The fruit picker ran dry before producing a usable position.
    #[error("fruit picker has no positions left")]
    FruitPickerExhausted,
}

/// Why a fruit could not be placed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no free interior cell left for a fruit")]
    BoardFull,

    #[error("fruit picker has no positions left")]
    PickerExhausted,
}
