use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SnakeError};
use crate::snake::Direction;

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tile {
    Empty = 0,
    Wall = 1,
    Snake = 2,
    Fruit = 3,
}

impl Tile {
    fn symbol(self) -> char {
        match self {
            Tile::Empty => '.',
            Tile::Wall => 'W',
            Tile::Snake => 'S',
            Tile::Fruit => 'F',
        }
    }

    fn from_symbol(ch: char) -> Option<Tile> {
        match ch {
            '.' => Some(Tile::Empty),
            'W' => Some(Tile::Wall),
            'S' => Some(Tile::Snake),
            'F' => Some(Tile::Fruit),
            _ => None,
        }
    }
}

/// A cell coordinate, `x` across the columns and `y` down the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `direction`, or `None` when it would fall off
    /// the top or left edge of the coordinate space.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        let x = offset(self.x, dx)?;
        let y = offset(self.y, dy)?;
        Some(Position { x, y })
    }
}

fn offset(value: usize, delta: i8) -> Option<usize> {
    if delta < 0 {
        value.checked_sub(delta.unsigned_abs() as usize)
    } else {
        value.checked_add(delta as usize)
    }
}

/// One cell whose rendered value changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileChange {
    pub position: Position,
    pub tile: Tile,
}

impl TileChange {
    pub fn new(position: Position, tile: Tile) -> Self {
        Self { position, tile }
    }
}

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickResult {
    pub game_over: bool,
    pub eating: bool,
    /// Apply in order to turn the previous board into the current one.
    pub changes: Vec<TileChange>,
}

impl TickResult {
    pub(crate) fn terminal() -> Self {
        TickResult { game_over: true, eating: false, changes: vec![] }
    }
}

/// A rows x columns grid of tiles, stored row by row.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    columns: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// A board whose outer ring is wall and whose interior is empty.
    pub fn walled(rows: usize, columns: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * columns);
        for y in 0..rows {
            for x in 0..columns {
                let on_ring = x == 0 || y == 0 || x == columns - 1 || y == rows - 1;
                cells.push(if on_ring { Tile::Wall } else { Tile::Empty });
            }
        }

        Board { rows, columns, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.columns && pos.y < self.rows
    }

    /// Strictly inside the wall ring.
    pub fn is_interior(&self, pos: Position) -> bool {
        pos.x > 0 && pos.y > 0 && pos.x + 1 < self.columns && pos.y + 1 < self.rows
    }

    /// Number of cells inside the wall ring.
    pub fn interior_cells(&self) -> usize {
        self.rows.saturating_sub(2) * self.columns.saturating_sub(2)
    }

    pub fn tile(&self, pos: Position) -> Result<Tile> {
        if !self.contains(pos) {
            return Err(SnakeError::OutOfBounds {
                position: pos,
                rows: self.rows,
                columns: self.columns,
            });
        }

        Ok(self.cells[self.index(pos)])
    }

    /// Overwrites a cell. Out of range positions are ignored.
    pub fn set(&mut self, pos: Position, tile: Tile) {
        if self.contains(pos) {
            let idx = self.index(pos);
            self.cells[idx] = tile;
        }
    }

    /// Replays a change list in order.
    pub fn apply(&mut self, changes: &[TileChange]) {
        for change in changes {
            self.set(change.position, change.tile);
        }
    }

    /// Every position on the board, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |y| (0..columns).map(move |x| Position::new(x, y)))
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[Tile]> {
        self.cells.chunks(self.columns)
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|t| **t == tile).count()
    }

    fn index(&self, pos: Position) -> usize {
        self.columns * pos.y + pos.x
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows_iter() {
            let line: String = row.iter().map(|t| t.symbol()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {}x{}", self.columns, self.rows)?;
        fmt::Display::fmt(self, f)
    }
}

/// Parses the `Display` form: one line per row, `W` wall, `S` snake,
/// `F` fruit, `.` empty. Surrounding whitespace on each line is ignored.
impl FromStr for Board {
    type Err = SnakeError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cells = vec![];
        let mut rows = 0;
        let mut columns = None;

        for line in s.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let row = line
                .chars()
                .map(|ch| {
                    Tile::from_symbol(ch).ok_or_else(|| {
                        SnakeError::InvalidConfiguration(format!("unknown tile symbol {:?}", ch))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            match columns {
                None => columns = Some(row.len()),
                Some(c) if c != row.len() => {
                    return Err(SnakeError::InvalidConfiguration(format!(
                        "row {} has {} cells, expected {}",
                        rows,
                        row.len(),
                        c
                    )))
                }
                Some(_) => {}
            }

            cells.extend(row);
            rows += 1;
        }

        match columns {
            Some(columns) => Ok(Board { rows, columns, cells }),
            None => Err(SnakeError::InvalidConfiguration("board has no rows".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walled_board_has_ring_and_empty_interior() {
        let board = Board::walled(5, 7);
        for pos in board.positions() {
            let expected = if board.is_interior(pos) { Tile::Empty } else { Tile::Wall };
            assert_eq!(board.tile(pos).unwrap(), expected, "at {:?}", pos);
        }
        assert_eq!(board.interior_cells(), 3 * 5);
        assert_eq!(board.count(Tile::Wall), 5 * 7 - 15);
    }

    #[test]
    fn tile_outside_board_is_an_error() {
        let board = Board::walled(5, 6);
        assert!(board.tile(Position::new(5, 4)).is_ok());
        assert_eq!(
            board.tile(Position::new(6, 0)),
            Err(SnakeError::OutOfBounds { position: Position::new(6, 0), rows: 5, columns: 6 })
        );
        assert!(board.tile(Position::new(0, 5)).is_err());
    }

    #[test]
    fn step_refuses_to_underflow() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::Up), None);
        assert_eq!(origin.step(Direction::Left), None);
        assert_eq!(origin.step(Direction::Right), Some(Position::new(1, 0)));
        assert_eq!(origin.step(Direction::Down), Some(Position::new(0, 1)));
    }

    #[test]
    fn apply_replays_in_order() {
        let mut board = Board::walled(5, 5);
        let p = Position::new(2, 2);
        board.apply(&[TileChange::new(p, Tile::Fruit), TileChange::new(p, Tile::Snake)]);
        assert_eq!(board.tile(p).unwrap(), Tile::Snake);
    }

    #[test]
    fn parses_its_own_display() {
        let text = "
            WWWWW
            W.F.W
            W.S.W
            W...W
            WWWWW
        ";
        let board: Board = text.parse().unwrap();
        assert_eq!(board.rows(), 5);
        assert_eq!(board.columns(), 5);
        assert_eq!(board.tile(Position::new(2, 1)).unwrap(), Tile::Fruit);
        assert_eq!(board.to_string().parse::<Board>().unwrap(), board);
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!("WWW\nWW".parse::<Board>().is_err());
        assert!("WXW".parse::<Board>().is_err());
    }

    #[test]
    fn rejects_empty_text() {
        for text in ["", "   ", "\n  \n\t\n"] {
            assert!(
                matches!(text.parse::<Board>(), Err(SnakeError::InvalidConfiguration(_))),
                "{:?}",
                text
            );
        }
    }
}
