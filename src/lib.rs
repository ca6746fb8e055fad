//! Grid snake simulation.
//!
//! [`SnakeEngine`] owns the board, the snake and the fruit and advances them one
//! cell per [`SnakeEngine::tick`]. Every tick reports the cells that changed so a
//! front end can redraw incrementally instead of repainting the whole board.
//! Nothing here does I/O; timing and input belong to the caller.

pub mod board;
pub mod error;
pub mod fruit;
pub mod snake;

pub use board::{Board, Position, TickResult, Tile, TileChange};
pub use error::{PlacementError, Result, SnakeError};
pub use fruit::{place_fruit, FruitPicker, RandomPicker, ScriptedPicker};
pub use snake::{step, Direction, EndReason, EngineConfig, GameState, SnakeEngine, Status, MIN_SIDE};
