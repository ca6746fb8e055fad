use std::io;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info};

use snake_engine::{
    Board,
    Direction::{self, *},
    EndReason, EngineConfig, Position, RandomPicker, SnakeEngine, Status, TickResult, TileChange,
};

const POLL_INTERVAL_MS: u64 = 5;

const START_INTERVAL_MS: u64 = 200;
const SPEEDUP_MS: u64 = 5;
const MIN_INTERVAL_MS: u64 = 32;

// Terminal cells are taller than they are wide.
const VERTICAL_STRETCH_PERCENT: u32 = 135;

/// Draws the board. Change lists must be applied in order.
pub trait Renderer {
    fn initial_render(&mut self, board: &Board) -> io::Result<()>;
    fn render_changes(&mut self, changes: &[TileChange]) -> io::Result<()>;
    fn render_dead_snake(&mut self, body: &[Position]) -> io::Result<()>;
    fn show_message(&mut self, lines: &[&str]) -> io::Result<()>;
    fn hide_message(&mut self) -> io::Result<()>;
}

pub trait Input {
    /// Key presses queued since the last call, without blocking.
    fn read_keys(&mut self) -> io::Result<Vec<KeyEvent>>;
    fn wait_key(&mut self) -> io::Result<KeyEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Turn(Direction),
    TogglePause,
    Quit,
    Ignore,
}

pub fn control_for(key: &KeyEvent) -> Control {
    if is_ctrl_c(key) {
        return Control::Quit;
    }

    match key.code {
        KeyCode::Char('w') | KeyCode::Up => Control::Turn(Up),
        KeyCode::Char('a') | KeyCode::Left => Control::Turn(Left),
        KeyCode::Char('s') | KeyCode::Down => Control::Turn(Down),
        KeyCode::Char('d') | KeyCode::Right => Control::Turn(Right),
        KeyCode::Esc => Control::TogglePause,
        _ => Control::Ignore,
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Time between ticks. Shrinks with every fruit down to a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pace {
    interval: Duration,
}

impl Pace {
    pub fn new() -> Self {
        Pace { interval: Duration::from_millis(START_INTERVAL_MS) }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn interval_for(&self, heading: Direction) -> Duration {
        if heading.is_vertical() {
            self.interval * VERTICAL_STRETCH_PERCENT / 100
        } else {
            self.interval
        }
    }

    pub fn speed_up(&mut self) {
        let ms = (self.interval.as_millis() as u64).saturating_sub(SPEEDUP_MS);
        self.interval = Duration::from_millis(ms.max(MIN_INTERVAL_MS));
    }
}

impl Default for Pace {
    fn default() -> Self {
        Self::new()
    }
}

/// One game from the first tick to game over.
pub struct Round {
    engine: SnakeEngine,
    pace: Pace,
    turn: Option<Direction>,
}

impl Round {
    pub fn new(engine: SnakeEngine) -> Self {
        Round { engine, pace: Pace::new(), turn: None }
    }

    pub fn engine(&self) -> &SnakeEngine {
        &self.engine
    }

    pub fn pace(&self) -> Pace {
        self.pace
    }

    /// Remembers the last key pressed; it is handed over right before the tick.
    pub fn press(&mut self, direction: Direction) {
        self.turn = Some(direction);
    }

    pub fn advance<R: Renderer>(&mut self, renderer: &mut R) -> io::Result<TickResult> {
        if let Some(dir) = self.turn.take() {
            self.engine.set_direction(dir);
        }

        let result = self.engine.tick();
        if result.eating {
            self.pace.speed_up();
        }
        if !result.changes.is_empty() {
            renderer.render_changes(&result.changes)?;
        }

        Ok(result)
    }

    pub fn next_interval(&self) -> Duration {
        self.pace.interval_for(self.engine.heading())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Replay,
    Quit,
}

pub struct SnakeGame<T> {
    term: T,
    config: EngineConfig,
    seed: Option<u64>,
    paused: bool,
}

impl<T: Renderer + Input> SnakeGame<T> {
    pub fn new(term: T, config: EngineConfig, seed: Option<u64>) -> Self {
        SnakeGame { term, config, seed, paused: false }
    }

    pub fn into_term(self) -> T {
        self.term
    }

    #[cfg(test)]
    fn term_mut(&mut self) -> &mut T {
        &mut self.term
    }

    pub fn show_intro(&mut self) -> Result<Flow> {
        let lines = &[
            "Arrow keys or WASD to move",
            "Esc to pause",
            "CTRL+C to quit",
            "",
            "Press any key to begin",
        ];

        self.term.show_message(lines)?;

        if is_ctrl_c(&self.term.wait_key()?) {
            return Ok(Flow::Quit);
        }

        self.term.hide_message()?;
        Ok(Flow::Replay)
    }

    pub fn new_round(&self) -> Result<Round> {
        let picker = match self.seed {
            Some(seed) => RandomPicker::seeded(seed),
            None => RandomPicker::from_entropy(),
        };
        info!("starting round with fruit seed {}", picker.seed());

        let engine = SnakeEngine::with_picker(self.config, picker)
            .context("Failed to create the game")?;
        Ok(Round::new(engine))
    }

    pub fn play(&mut self) -> Result<Flow> {
        let mut round = self.new_round()?;
        self.paused = false;
        self.term.initial_render(&round.engine().board()).context("Failed to draw the board")?;

        let mut next_step = Instant::now() + round.next_interval();

        loop {
            sleep(Duration::from_millis(POLL_INTERVAL_MS));

            for key in self.term.read_keys()? {
                match control_for(&key) {
                    Control::Quit => return Ok(Flow::Quit),
                    Control::TogglePause => self.toggle_pause()?,
                    Control::Turn(dir) => round.press(dir),
                    Control::Ignore => {}
                }
            }

            if self.paused {
                next_step = Instant::now() + round.next_interval();
                continue;
            }

            if Instant::now() < next_step {
                continue;
            }

            let result = round.advance(&mut self.term)?;
            if result.game_over {
                break;
            }
            if result.eating {
                debug!("interval now {:?}", round.pace().interval());
            }

            next_step = Instant::now() + round.next_interval();
        }

        self.game_over(round.engine())?;

        // Quit if the user CTRL+C's after the game
        if is_ctrl_c(&self.term.wait_key()?) {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Replay)
        }
    }

    fn game_over(&mut self, engine: &SnakeEngine) -> Result<()> {
        let score = engine.score();
        info!("round over: {:?}, score {}, {} ticks", engine.status(), score, engine.ticks());

        let headline = match engine.status() {
            Status::GameOver(EndReason::BoardFull) => "You won!",
            Status::GameOver(EndReason::FruitUnavailable) => "Out of fruit!",
            _ => "Game over!",
        };

        if let Status::GameOver(EndReason::Wall) | Status::GameOver(EndReason::SelfCollision) =
            engine.status()
        {
            let body: Vec<Position> = engine.snake().iter().copied().collect();
            self.term.render_dead_snake(&body)?;
        }

        self.term.show_message(&[
            headline,
            &*format!("Score: {}", score),
            "",
            "Press any key to play again,",
            "or CTRL+C to quit.",
        ])?;
        Ok(())
    }

    fn toggle_pause(&mut self) -> io::Result<()> {
        if !self.paused {
            self.term.show_message(&["Paused", "Press Esc to resume", "or Ctrl+C to quit"])?;
        } else {
            self.term.hide_message()?;
        }

        self.paused = !self.paused;
        Ok(())
    }
}
