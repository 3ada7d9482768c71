mod app;
mod config;
mod saver;
mod store;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::{fs, io};

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossword::progress::{ProgressKey, SaveDebouncer};
use crossword::{Puzzle, Session};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Notice};
use crate::config::{Config, ConfigError};
use crate::saver::SaveWorker;
use crate::store::FileStore;

/// Solve crossword puzzles in your terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
  /// Puzzle document (JSON)
  puzzle: PathBuf,
  /// Whose progress to load and save
  #[arg(long)]
  user: Option<String>,
  /// Config file [default: crosstui.toml if present]
  #[arg(long)]
  config: Option<PathBuf>,
  /// Grid size, overriding the config
  #[arg(long)]
  size: Option<usize>,
}

#[derive(Debug, Error)]
enum CliError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("could not read {path}: {source}")]
  Read { path: PathBuf, source: io::Error },
  #[error("could not load {path}: {source}")]
  Puzzle {
    path: PathBuf,
    source: crossword::Error,
  },
  #[error(transparent)]
  Io(#[from] io::Error),
}

fn main() {
  if let Err(e) = run(Args::parse()) {
    eprintln!("crosstui: {}", e);
    std::process::exit(1);
  }
}

fn run(args: Args) -> Result<(), CliError> {
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(user) = args.user {
    config.progress.user = user;
  }
  if let Some(size) = args.size {
    config.grid.size = size;
  }
  init_logging(&config.log.file)?;

  let puzzle = load_puzzle(&args.puzzle, config.grid.size)?;
  let key = ProgressKey::new(config.progress.user.clone(), puzzle_key(&puzzle, &args.puzzle));
  let store = FileStore::new(&config.progress.directory);

  let mut session = Session::new(puzzle);
  let notice = match session.resume(&store, &key) {
    Ok(_) => None,
    Err(e) => Some(Notice::Warning(format!("Starting fresh: {}", e))),
  };

  let saver = SaveWorker::spawn(store, key)?;
  let debouncer = SaveDebouncer::new(config.progress.save_interval());
  let mut app = App::new(session, debouncer, saver, notice);

  let mut terminal = ratatui::init();
  let result = execute!(io::stdout(), EnableMouseCapture).and_then(|_| app.run(&mut terminal));
  release_mouse(&mut io::stdout());
  ratatui::restore();

  if let Some(error) = app.close() {
    eprintln!("crosstui: progress not saved: {}", error);
  }
  info!("closed");
  Ok(result?)
}

/// Teardown carries on even if the terminal will not take the escape sequence.
fn release_mouse(out: &mut impl io::Write) -> bool {
  match execute!(out, DisableMouseCapture) {
    Ok(()) => true,
    Err(e) => {
      warn!(error = %e, "could not release the mouse");
      false
    }
  }
}

fn init_logging(file: &Path) -> io::Result<()> {
  let file = OpenOptions::new().create(true).append(true).open(file)?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

fn load_puzzle(path: &Path, size: usize) -> Result<Puzzle, CliError> {
  let text = fs::read_to_string(path).map_err(|source| CliError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  Puzzle::from_json(&text, size).map_err(|source| CliError::Puzzle {
    path: path.to_path_buf(),
    source,
  })
}

/// Progress is keyed by the puzzle's id, or its file name when it has none.
fn puzzle_key(puzzle: &Puzzle, path: &Path) -> String {
  match &puzzle.info().id {
    Some(id) => id.to_string(),
    None => path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_else(|| "puzzle".to_owned()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Closed;

  impl io::Write for Closed {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
      Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
      Err(io::ErrorKind::BrokenPipe.into())
    }
  }

  #[test]
  fn releasing_the_mouse_reports_failure() {
    let mut out = Vec::new();
    assert!(release_mouse(&mut out));
    assert!(!out.is_empty());
    assert!(!release_mouse(&mut Closed));
  }

  #[test]
  fn progress_key_falls_back_to_the_file_name() {
    let text = r#"{"grid": "CATO.OWOE", "clues": []}"#;
    let puzzle = Puzzle::from_json(text, 3).unwrap();
    assert_eq!(puzzle_key(&puzzle, Path::new("puzzles/mini.json")), "mini");

    let text = r#"{"id": 7, "grid": "CATO.OWOE", "clues": []}"#;
    let puzzle = Puzzle::from_json(text, 3).unwrap();
    assert_eq!(puzzle_key(&puzzle, Path::new("puzzles/mini.json")), "7");
  }
}
