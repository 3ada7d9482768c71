//! This crate is the grid engine behind a crossword solving app.
//! It provides no UI itself, but see `crosstui` for an example of how you can use it
//! to produce a crossword app.
//!
//! A puzzle document is loaded into a [Puzzle], which derives the clue numbering
//! from the black/white layout and checks that the clues agree with it. A [Session]
//! then owns everything that changes while solving: the letters the user has
//! entered and the [Cursor]. User input goes in as [Event]s.

use Direction::{Across, Down};
use serde::{Deserialize, Serialize};
use std::ops::Not;
use thiserror::Error;

mod clues;
mod completion;
mod cursor;
mod layout;
pub mod progress;
mod puzzle;
mod session;
mod topology;
mod user_grid;

pub use clues::{Clue, ClueIndex};
pub use completion::is_solved;
pub use cursor::{Arrow, CellEdit, Cursor, CursorController, Event, Transition};
pub use layout::{Glyph, PuzzleLayout, RawGrid};
pub use puzzle::{Puzzle, PuzzleId, PuzzleInfo, PuzzleSource, Solution};
pub use session::{ResumeError, Session, Update};
pub use topology::{Cell, Positions, Topology};
pub use user_grid::UserGrid;

/// Side length of a standard daily grid.
pub const STANDARD_SIZE: usize = 15;

/// The two crossword directions: `Across` and `Down`
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Across,
  Down,
}

impl Direction {
  /// The (row, column) step taken when moving forward in this direction.
  pub fn delta(self) -> (isize, isize) {
    match self {
      Across => (0, 1),
      Down => (1, 0),
    }
  }
}

impl Not for Direction {
  type Output = Self;
  fn not(self) -> Self {
    match self {
      Across => Down,
      Down => Across,
    }
  }
}

impl std::fmt::Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Across => write!(f, "across"),
      Down => write!(f, "down"),
    }
  }
}

/// A position in a grid: (row, column)
pub type Pos = (usize, usize);

/// Data-integrity problems found while loading a puzzle. Any of these refuses the
/// whole load; nothing is partially initialized.
#[derive(Debug, Error)]
pub enum Error {
  /// The puzzle document could not be decoded.
  #[error("malformed puzzle document: {0}")]
  Document(#[from] serde_json::Error),
  /// The grid was present but in none of the accepted shapes.
  #[error("malformed grid: {0}")]
  MalformedGrid(String),
  #[error("layout has {actual} cells, expected {expected}")]
  LayoutLength { expected: usize, actual: usize },
  #[error("layout has no open cells")]
  NoOpenCells,
  #[error("solution has {actual} cells, expected {expected}")]
  SolutionLength { expected: usize, actual: usize },
  /// The solution has no letter for an open cell, or a letter for a black one.
  #[error("solution disagrees with the layout at ({row}, {col})")]
  SolutionMismatch { row: usize, col: usize },
  #[error("{number} {direction} does not start at a numbered cell")]
  UnknownClueStart { number: u32, direction: Direction },
  #[error("{number} {direction} is anchored at ({row}, {col}), which does not carry that number")]
  ClueAnchorMismatch {
    number: u32,
    direction: Direction,
    row: usize,
    col: usize,
  },
  #[error("{number} {direction} answer has {actual} letters but its span has {expected}")]
  AnswerLength {
    number: u32,
    direction: Direction,
    expected: usize,
    actual: usize,
  },
  #[error("{number} {direction} answer does not match the solution grid")]
  AnswerMismatch { number: u32, direction: Direction },
  #[error("{number} {direction} appears more than once")]
  DuplicateClue { number: u32, direction: Direction },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direction_not_and_delta() {
    assert_eq!(!Across, Down);
    assert_eq!(!Down, Across);
    assert_eq!(Across.delta(), (0, 1));
    assert_eq!(Down.delta(), (1, 0));
  }

  #[test]
  fn direction_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Down).unwrap(), "\"down\"");
    let parsed: Direction = serde_json::from_str("\"across\"").unwrap();
    assert_eq!(parsed, Across);
  }
}
