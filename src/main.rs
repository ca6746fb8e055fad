mod game;
mod term;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use snake_engine::EngineConfig;

use crate::game::{Flow, SnakeGame};
use crate::term::TermManager;

#[derive(Parser)]
#[command(name = "snake")]
#[command(version, about = "Snake in the terminal")]
struct Cli {
    /// Board height including the walls
    #[arg(long, default_value_t = 21)]
    rows: usize,

    /// Board width including the walls
    #[arg(long, default_value_t = 21)]
    columns: usize,

    /// Seed for fruit placement; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the log (the terminal is busy with the game)
    #[arg(long, default_value = "snake.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?;
    WriteLogger::init(cli.log_level, Config::default(), log_file)
        .context("Failed to initialize logger")?;

    let config = EngineConfig::new(cli.rows, cli.columns);
    config.resolve().context("Invalid board size")?;
    info!("starting {}x{} snake", cli.columns, cli.rows);

    let mut term = TermManager::new().context("Failed to read terminal size")?;
    term.setup().context("Failed to set up terminal")?;

    let mut game = SnakeGame::new(term, config, cli.seed);
    let result = run(&mut game);

    // Logged before the restore, which may fail too
    if let Err(err) = &result {
        error!("{:#}", err);
    }

    // Restore the terminal even when the game loop failed
    if let Err(err) = game.into_term().restore() {
        error!("failed to restore terminal: {}", err);
        return result.and(Err(err).context("Failed to restore terminal"));
    }
    result
}

fn run(game: &mut SnakeGame<TermManager>) -> Result<()> {
    if game.show_intro()? == Flow::Quit {
        return Ok(());
    }

    // The game loop hands back control on CTRL+C or after each round
    while game.play()? == Flow::Replay {}

    info!("bye");
    Ok(())
}
