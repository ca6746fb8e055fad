use std::collections::VecDeque;

use log::{debug, info};

use crate::board::{Board, Position, TickResult, Tile, TileChange};
use crate::error::{PlacementError, Result, SnakeError};
use crate::fruit::{place_fruit, FruitPicker, RandomPicker};
use Direction::*;

/// Smallest allowed side length. Anything narrower leaves no room to move.
pub const MIN_SIDE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Up, Left, Down, Right];

    pub fn reverse(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    /// (dx, dy) with y growing downwards.
    pub fn delta(self) -> (i8, i8) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    /// Whether a snake heading `self` may turn to `to`. Repeating the current
    /// heading or reversing into the neck are both refused.
    pub fn accepts_turn(self, to: Direction) -> bool {
        to != self && to != self.reverse()
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Up | Down)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Wall,
    SelfCollision,
    /// The snake covers every interior cell.
    BoardFull,
    /// The fruit picker ran dry while a fruit was needed.
    FruitUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    GameOver(EndReason),
}

/// Board dimensions. A missing side copies the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub rows: Option<usize>,
    pub columns: Option<usize>,
}

impl EngineConfig {
    pub fn new(rows: usize, columns: usize) -> Self {
        EngineConfig { rows: Some(rows), columns: Some(columns) }
    }

    pub fn square(side: usize) -> Self {
        Self::new(side, side)
    }

    /// Returns `(rows, columns)`.
    pub fn resolve(&self) -> Result<(usize, usize)> {
        let (rows, columns) = match (self.rows, self.columns) {
            (Some(r), Some(c)) => (r, c),
            (Some(r), None) => (r, r),
            (None, Some(c)) => (c, c),
            (None, None) => {
                return Err(SnakeError::InvalidConfiguration(
                    "rows or columns must be given".to_string(),
                ))
            }
        };

        if rows < MIN_SIDE || columns < MIN_SIDE {
            return Err(SnakeError::InvalidConfiguration(format!(
                "board must be at least {}x{}, got {}x{}",
                MIN_SIDE, MIN_SIDE, columns, rows
            )));
        }

        if rows.checked_mul(columns).is_none() {
            return Err(SnakeError::InvalidConfiguration(format!(
                "board {}x{} is too large",
                columns, rows
            )));
        }

        Ok((rows, columns))
    }
}

/// Everything the simulation needs between ticks.
///
/// `board` holds walls and the fruit only; the snake is kept in `snake`,
/// head first, and drawn over the board by [`GameState::board`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    snake: VecDeque<Position>,
    heading: Direction,
    fruit: Option<Position>,
    status: Status,
    eaten: usize,
    ticks: u64,
}

impl GameState {
    pub fn new(config: &EngineConfig, picker: &mut dyn FruitPicker) -> Result<Self> {
        let (rows, columns) = config.resolve()?;
        let mut board = Board::walled(rows, columns);

        let mut snake = VecDeque::new();
        snake.push_front(Position::new(columns / 2, rows / 2));

        let fruit = match place_fruit(&board, &snake, picker) {
            Ok(pos) => pos,
            Err(PlacementError::PickerExhausted) => return Err(SnakeError::FruitPickerExhausted),
            Err(PlacementError::BoardFull) => {
                return Err(SnakeError::InvalidConfiguration(
                    "board has no room for fruit".to_string(),
                ))
            }
        };
        board.set(fruit, Tile::Fruit);

        Ok(GameState {
            board,
            snake,
            heading: Right,
            fruit: Some(fruit),
            status: Status::Active,
            eaten: 0,
            ticks: 0,
        })
    }

    /// A copy of the grid with the snake drawn on it.
    pub fn board(&self) -> Board {
        let mut copy = self.board.clone();
        for seg in &self.snake {
            copy.set(*seg, Tile::Snake);
        }
        copy
    }

    pub fn tile(&self, pos: Position) -> Result<Tile> {
        let tile = self.board.tile(pos)?;
        if self.snake.contains(&pos) {
            Ok(Tile::Snake)
        } else {
            Ok(tile)
        }
    }

    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn columns(&self) -> usize {
        self.board.columns()
    }

    pub fn snake(&self) -> &VecDeque<Position> {
        &self.snake
    }

    pub fn head(&self) -> Position {
        self.snake[0]
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// `None` only once the game has ended without room for another fruit.
    pub fn fruit(&self) -> Option<Position> {
        self.fruit
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != Status::Active
    }

    /// Fruit eaten so far.
    pub fn score(&self) -> usize {
        self.eaten
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn end(&mut self, reason: EndReason) {
        debug!("game over after {} ticks: {:?}, length {}", self.ticks, reason, self.snake.len());
        self.status = Status::GameOver(reason);
    }
}

/// Advances `state` by one cell.
///
/// `pending` is applied first when it is a legal turn from the current
/// heading. A finished game comes back unchanged with an empty change list.
pub fn step(
    state: &GameState,
    pending: Option<Direction>,
    picker: &mut dyn FruitPicker,
) -> (GameState, TickResult) {
    if state.is_over() {
        return (state.clone(), TickResult::terminal());
    }

    let mut next = state.clone();
    next.ticks += 1;

    if let Some(dir) = pending {
        if next.heading.accepts_turn(dir) {
            next.heading = dir;
        }
    }

    let new_head = match next.head().step(next.heading) {
        Some(pos) if next.board.is_interior(pos) => pos,
        _ => {
            next.end(EndReason::Wall);
            return (next, TickResult::terminal());
        }
    };

    let eating = next.fruit == Some(new_head);

    // The tail only gets out of the way when nothing is eaten this tick.
    let vacating = if eating { None } else { next.snake.back().copied() };
    if next.snake.iter().any(|seg| *seg == new_head && Some(*seg) != vacating) {
        next.end(EndReason::SelfCollision);
        return (next, TickResult::terminal());
    }

    next.snake.push_front(new_head);
    let mut result = TickResult {
        game_over: false,
        eating,
        changes: vec![TileChange::new(new_head, Tile::Snake)],
    };

    if eating {
        next.eaten += 1;
        next.board.set(new_head, Tile::Empty);
        next.fruit = None;
        debug!("ate fruit at ({}, {}), length {}", new_head.x, new_head.y, next.snake.len());

        match place_fruit(&next.board, &next.snake, picker) {
            Ok(pos) => {
                next.board.set(pos, Tile::Fruit);
                next.fruit = Some(pos);
                result.changes.push(TileChange::new(pos, Tile::Fruit));
            }
            Err(PlacementError::BoardFull) => {
                next.end(EndReason::BoardFull);
                result.game_over = true;
            }
            Err(PlacementError::PickerExhausted) => {
                next.end(EndReason::FruitUnavailable);
                result.game_over = true;
            }
        }
    } else if let Some(tail) = next.snake.pop_back() {
        if tail != new_head {
            result.changes.push(TileChange::new(tail, Tile::Empty));
        }
    }

    (next, result)
}

/// Owns a [`GameState`], the buffered turn and the fruit picker.
///
/// Not meant for concurrent use; wrap it in a lock if several threads drive it.
pub struct SnakeEngine {
    state: GameState,
    pending: Option<Direction>,
    picker: Box<dyn FruitPicker>,
}

impl SnakeEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_picker(config, RandomPicker::from_entropy())
    }

    pub fn with_picker<P>(config: EngineConfig, picker: P) -> Result<Self>
    where
        P: FruitPicker + 'static,
    {
        let mut picker: Box<dyn FruitPicker> = Box::new(picker);
        let state = GameState::new(&config, picker.as_mut())?;
        info!("new {}x{} game, fruit at {:?}", state.columns(), state.rows(), state.fruit());

        Ok(SnakeEngine { state, pending: None, picker })
    }

    /// Buffers a turn for the next tick. Turns that repeat or reverse the
    /// current heading are dropped; otherwise the latest call wins.
    pub fn set_direction(&mut self, direction: Direction) {
        if self.state.heading.accepts_turn(direction) {
            self.pending = Some(direction);
        }
    }

    pub fn tick(&mut self) -> TickResult {
        let pending = self.pending.take();
        let (next, result) = step(&self.state, pending, self.picker.as_mut());
        self.state = next;
        result
    }

    pub fn board(&self) -> Board {
        self.state.board()
    }

    pub fn tile(&self, pos: Position) -> Result<Tile> {
        self.state.tile(pos)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn heading(&self) -> Direction {
        self.state.heading
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending
    }

    pub fn snake(&self) -> &VecDeque<Position> {
        self.state.snake()
    }

    pub fn len(&self) -> usize {
        self.state.snake.len()
    }

    pub fn fruit(&self) -> Option<Position> {
        self.state.fruit
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn score(&self) -> usize {
        self.state.eaten
    }

    pub fn ticks(&self) -> u64 {
        self.state.ticks
    }

    pub fn rows(&self) -> usize {
        self.state.rows()
    }

    pub fn columns(&self) -> usize {
        self.state.columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fruit::ScriptedPicker;

    fn at(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn reverse_table_is_symmetric() {
        for dir in Direction::ALL.iter() {
            assert_ne!(dir.reverse(), *dir);
            assert_eq!(dir.reverse().reverse(), *dir);
            let (dx, dy) = dir.delta();
            assert_eq!(dir.reverse().delta(), (-dx, -dy));
        }
    }

    #[test]
    fn accepts_only_quarter_turns() {
        assert!(Right.accepts_turn(Up));
        assert!(Right.accepts_turn(Down));
        assert!(!Right.accepts_turn(Right));
        assert!(!Right.accepts_turn(Left));
        assert!(!Up.accepts_turn(Down));
    }

    #[test]
    fn config_mirrors_missing_side() {
        assert_eq!(EngineConfig { rows: None, columns: Some(5) }.resolve(), Ok((5, 5)));
        assert_eq!(EngineConfig { rows: Some(9), columns: None }.resolve(), Ok((9, 9)));
        assert_eq!(EngineConfig::new(7, 12).resolve(), Ok((7, 12)));
    }

    #[test]
    fn config_rejects_small_or_missing_sides() {
        for config in [
            EngineConfig::default(),
            EngineConfig::new(4, 10),
            EngineConfig::new(10, 4),
            EngineConfig::square(0),
        ] {
            assert!(
                matches!(config.resolve(), Err(SnakeError::InvalidConfiguration(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn config_rejects_boards_too_large_to_allocate() {
        for config in [
            EngineConfig::new(1 << (usize::BITS / 2 + 1), 1 << (usize::BITS / 2 + 1)),
            EngineConfig::new(usize::MAX, MIN_SIDE),
            EngineConfig { rows: None, columns: Some(usize::MAX) },
        ] {
            assert!(
                matches!(config.resolve(), Err(SnakeError::InvalidConfiguration(_))),
                "{:?}",
                config
            );
        }

        let huge = EngineConfig::square(1 << (usize::BITS / 2 + 1));
        let err = SnakeEngine::with_picker(huge, ScriptedPicker::new(vec![at(1, 1)])).err();
        assert!(matches!(err, Some(SnakeError::InvalidConfiguration(_))));
    }

    #[test]
    fn step_is_pure() {
        let mut picker = ScriptedPicker::new(vec![at(1, 1)]);
        let state = GameState::new(&EngineConfig::square(7), &mut picker).unwrap();
        let before = state.clone();

        let (next, result) = step(&state, Some(Down), &mut picker);

        assert_eq!(state, before);
        assert_eq!(next.head(), at(3, 4));
        assert_eq!(next.heading(), Down);
        assert_eq!(
            result.changes,
            vec![TileChange::new(at(3, 4), Tile::Snake), TileChange::new(at(3, 3), Tile::Empty)]
        );
    }

    #[test]
    fn reversal_in_step_is_ignored() {
        let mut picker = ScriptedPicker::new(vec![at(1, 1)]);
        let state = GameState::new(&EngineConfig::square(7), &mut picker).unwrap();

        let (next, _) = step(&state, Some(Left), &mut picker);

        assert_eq!(next.heading(), Right);
        assert_eq!(next.head(), at(4, 3));
    }

    #[test]
    fn later_valid_turn_wins_and_invalid_ones_do_not_clear_it() {
        let picker = ScriptedPicker::new(vec![at(1, 1)]);
        let mut engine = SnakeEngine::with_picker(EngineConfig::square(9), picker).unwrap();

        engine.set_direction(Up);
        engine.set_direction(Down);
        engine.set_direction(Left);
        engine.set_direction(Right);
        assert_eq!(engine.pending_direction(), Some(Down));

        engine.tick();
        assert_eq!(engine.heading(), Down);
        assert_eq!(engine.pending_direction(), None);
        assert_eq!(engine.snake()[0], at(4, 5));
    }

    #[test]
    fn chasing_the_tail_is_allowed() {
        let fruit = vec![at(11, 10), at(12, 10), at(13, 10), at(1, 1)];
        let mut engine =
            SnakeEngine::with_picker(EngineConfig::square(21), ScriptedPicker::new(fruit)).unwrap();

        for _ in 0..3 {
            assert!(engine.tick().eating);
        }
        assert_eq!(engine.len(), 4);

        engine.set_direction(Down);
        engine.tick();
        engine.set_direction(Left);
        engine.tick();
        assert_eq!(engine.snake().back(), Some(&at(12, 10)));

        engine.set_direction(Up);
        let result = engine.tick();

        assert!(!result.game_over);
        assert_eq!(result.changes, vec![TileChange::new(at(12, 10), Tile::Snake)]);
        assert_eq!(engine.len(), 4);
    }

    #[test]
    fn exhausted_picker_mid_game_ends_the_game() {
        let picker = ScriptedPicker::new(vec![at(3, 2)]);
        let mut engine = SnakeEngine::with_picker(EngineConfig::square(5), picker).unwrap();

        let result = engine.tick();

        assert!(result.game_over);
        assert!(result.eating);
        assert_eq!(result.changes, vec![TileChange::new(at(3, 2), Tile::Snake)]);
        assert_eq!(engine.status(), Status::GameOver(EndReason::FruitUnavailable));
        assert_eq!(engine.fruit(), None);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn exhausted_picker_at_start_is_an_error() {
        let err =
            SnakeEngine::with_picker(EngineConfig::square(5), ScriptedPicker::default()).err();
        assert_eq!(err, Some(SnakeError::FruitPickerExhausted));
    }
}
