use std::io::{self, stdout, Stdout, Write};
use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyEvent, KeyEventKind};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style, terminal};

use snake_engine::{Board, Position, Tile, TileChange};

use crate::game::{Input, Renderer};

type Coords = (u16, u16);

const SNAKE_BODY_CHAR: char = '█';
const FRUIT_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';

pub struct TermManager {
    width: u16,
    height: u16,
    stdout: Stdout,
    screen: Vec<char>,
    current_msg: Option<Message>,
    // Screen cell of board position (0, 0) and the board size.
    origin: Coords,
    board_size: Coords,
}

struct Message {
    top_left: Coords,
    width: u16,
    height: u16,
}

impl TermManager {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let screen = vec![' '; width as usize * height as usize];

        Ok(TermManager {
            width,
            height,
            stdout: stdout(),
            screen,
            current_msg: None,
            origin: (0, 0),
            board_size: (0, 0),
        })
    }

    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)
    }

    pub fn restore(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    pub fn show_message(&mut self, lines: &[&str]) -> io::Result<()> {
        if self.current_msg.is_some() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as u16;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as u16;
        let center = (self.width / 2, self.height / 2);
        let top_left = (
            center.0.saturating_sub(msg_width / 2),
            center.1.saturating_sub(msg_height / 2),
        );

        // Blank lines above and below the text
        for y in [top_left.1, top_left.1 + msg_height - 1] {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, y), ' ')?;
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as u16 + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as u16, y), ch)?;
            }
        }

        self.current_msg = Some(Message { width: msg_width, height: msg_height, top_left });
        self.flush()
    }

    pub fn hide_message(&mut self) -> io::Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };

        // Put back whatever the message covered
        for y_diff in 0..msg.height {
            for x_diff in 0..msg.width {
                let (x, y) = (msg.top_left.0 + x_diff, msg.top_left.1 + y_diff);
                if let Some(&ch) = self.screen.get(self.width as usize * y as usize + x as usize) {
                    self.print_at_no_save((x, y), ch)?;
                }
            }
        }

        self.flush()
    }

    pub fn clear(&mut self) -> io::Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![' '; self.width as usize * self.height as usize];
        self.current_msg = None;
        Ok(())
    }

    fn print_at(&mut self, pos: Coords, ch: char) -> io::Result<()> {
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        let idx = self.width as usize * pos.1 as usize + pos.0 as usize;
        if let Some(cell) = self.screen.get_mut(idx) {
            *cell = ch;
        }
        Ok(())
    }

    // For messages: the screen buffer keeps what was underneath so it can be restored.
    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> io::Result<()> {
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    fn draw_tile(&mut self, pos: Position, tile: Tile) -> io::Result<()> {
        let ch = match tile {
            Tile::Empty => ' ',
            Tile::Snake => SNAKE_BODY_CHAR,
            Tile::Fruit => FRUIT_CHAR,
            Tile::Wall => self.wall_char(pos),
        };
        self.print_at(self.screen_coords(pos), ch)
    }

    fn wall_char(&self, pos: Position) -> char {
        let (columns, rows) = (self.board_size.0 as usize, self.board_size.1 as usize);
        let edge_x = pos.x == 0 || pos.x + 1 == columns;
        let edge_y = pos.y == 0 || pos.y + 1 == rows;

        match (edge_x, edge_y) {
            (true, true) => '+',
            (false, true) => '-',
            (true, false) => '|',
            (false, false) => '#',
        }
    }

    fn screen_coords(&self, pos: Position) -> Coords {
        (self.origin.0 + pos.x as u16, self.origin.1 + pos.y as u16)
    }
}

impl Renderer for TermManager {
    fn initial_render(&mut self, board: &Board) -> io::Result<()> {
        if board.columns() > self.width as usize || board.rows() > self.height as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "a {}x{} board does not fit a {}x{} terminal",
                    board.columns(),
                    board.rows(),
                    self.width,
                    self.height
                ),
            ));
        }

        self.clear()?;
        self.board_size = (board.columns() as u16, board.rows() as u16);
        self.origin = (
            (self.width - self.board_size.0) / 2,
            (self.height - self.board_size.1) / 2,
        );

        for pos in board.positions() {
            let tile = board.tile(pos).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.draw_tile(pos, tile)?;
        }

        self.flush()
    }

    fn render_changes(&mut self, changes: &[TileChange]) -> io::Result<()> {
        for change in changes {
            self.draw_tile(change.position, change.tile)?;
        }
        self.flush()
    }

    fn render_dead_snake(&mut self, body: &[Position]) -> io::Result<()> {
        for pos in body {
            self.print_at(self.screen_coords(*pos), DEAD_SNAKE_CHAR)?;
        }
        self.flush()
    }

    fn show_message(&mut self, lines: &[&str]) -> io::Result<()> {
        TermManager::show_message(self, lines)
    }

    fn hide_message(&mut self) -> io::Result<()> {
        TermManager::hide_message(self)
    }
}

impl Input for TermManager {
    fn read_keys(&mut self) -> io::Result<Vec<KeyEvent>> {
        let mut events = vec![];

        while poll(Duration::from_millis(1))? {
            match read()? {
                Event::Key(ev) if ev.kind == KeyEventKind::Press => events.push(ev),
                _ => {}
            }
        }

        Ok(events)
    }

    fn wait_key(&mut self) -> io::Result<KeyEvent> {
        loop {
            match read()? {
                Event::Key(ev) if ev.kind == KeyEventKind::Press => return Ok(ev),
                _ => {}
            }
        }
    }
}
