use std::collections::VecDeque;

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, Position};
use crate::error::PlacementError;

/// Source of candidate fruit positions.
///
/// Candidates don't have to be valid: placement keeps asking until one lands
/// on a free interior cell. Returning `None` means the source is exhausted.
pub trait FruitPicker {
    fn pick(&mut self, rows: usize, columns: usize) -> Option<Position>;
}

impl<F> FruitPicker for F
where
    F: FnMut() -> Option<Position>,
{
    fn pick(&mut self, _rows: usize, _columns: usize) -> Option<Position> {
        self()
    }
}

/// Uniform picks over the whole grid, walls included.
pub struct RandomPicker {
    rng: StdRng,
    seed: u64,
}

impl RandomPicker {
    pub fn seeded(seed: u64) -> Self {
        RandomPicker { rng: StdRng::seed_from_u64(seed), seed }
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl FruitPicker for RandomPicker {
    fn pick(&mut self, rows: usize, columns: usize) -> Option<Position> {
        let x = self.rng.gen_range(0..columns);
        let y = self.rng.gen_range(0..rows);
        Some(Position::new(x, y))
    }
}

/// Hands out a fixed list of positions in order, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicker {
    queue: VecDeque<Position>,
}

impl ScriptedPicker {
    pub fn new<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        ScriptedPicker { queue: positions.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl FruitPicker for ScriptedPicker {
    fn pick(&mut self, _rows: usize, _columns: usize) -> Option<Position> {
        self.queue.pop_front()
    }
}

/// Chooses a fruit cell that is inside the walls and not covered by `snake`.
///
/// `board` must not have the snake drawn on it; `snake` holds distinct
/// interior cells.
pub fn place_fruit(
    board: &Board,
    snake: &VecDeque<Position>,
    picker: &mut dyn FruitPicker,
) -> Result<Position, PlacementError> {
    if snake.len() >= board.interior_cells() {
        return Err(PlacementError::BoardFull);
    }

    loop {
        let candidate = picker
            .pick(board.rows(), board.columns())
            .ok_or(PlacementError::PickerExhausted)?;

        if board.is_interior(candidate) && !snake.contains(&candidate) {
            return Ok(candidate);
        }

        trace!("rejected fruit candidate ({}, {})", candidate.x, candidate.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(cells: &[(usize, usize)]) -> VecDeque<Position> {
        cells.iter().map(|&(x, y)| Position::new(x, y)).collect()
    }

    #[test]
    fn skips_walls_and_snake() {
        let board = Board::walled(5, 5);
        let snake = body(&[(2, 2)]);
        let mut picker = ScriptedPicker::new(vec![
            Position::new(0, 0),
            Position::new(4, 2),
            Position::new(2, 2),
            Position::new(1, 3),
            Position::new(3, 3),
        ]);

        assert_eq!(place_fruit(&board, &snake, &mut picker), Ok(Position::new(1, 3)));
        assert_eq!(picker.remaining(), 1);
    }

    #[test]
    fn exhausted_script_is_reported() {
        let board = Board::walled(5, 5);
        let snake = body(&[(2, 2)]);
        let mut picker = ScriptedPicker::new(vec![Position::new(2, 2)]);

        assert_eq!(place_fruit(&board, &snake, &mut picker), Err(PlacementError::PickerExhausted));
    }

    #[test]
    fn full_board_does_not_sample() {
        let board = Board::walled(5, 5);
        let snake = board.positions().filter(|p| board.is_interior(*p)).collect();
        let mut calls = 0;
        let mut picker = || {
            calls += 1;
            Some(Position::new(1, 1))
        };

        assert_eq!(place_fruit(&board, &snake, &mut picker), Err(PlacementError::BoardFull));
        assert_eq!(calls, 0);
    }

    #[test]
    fn random_picks_land_on_the_only_free_cell() {
        let board = Board::walled(6, 6);
        let free = Position::new(3, 4);
        let snake = board.positions().filter(|p| board.is_interior(*p) && *p != free).collect();
        let mut picker = RandomPicker::seeded(7);

        assert_eq!(place_fruit(&board, &snake, &mut picker), Ok(free));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomPicker::seeded(42);
        let mut b = RandomPicker::seeded(42);
        for _ in 0..20 {
            let pa = a.pick(9, 13).unwrap();
            assert_eq!(Some(pa), b.pick(9, 13));
            assert!(pa.x < 13 && pa.y < 9);
        }
        assert_eq!(a.seed(), 42);
    }
}
