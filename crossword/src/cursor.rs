//! The cursor state machine. Every transition is a pure function of the current
//! [Cursor], one [Event], the puzzle's cell matrix and clues, and the letters
//! entered so far; it returns the next cursor plus at most one cell edit.

use crate::Direction::{self, Across, Down};
use crate::{Clue, ClueIndex, Pos, Topology, UserGrid};
use tracing::debug;

/// Represents the position of the user's currently-highlighted square, and the `Direction`
/// of the word they are currently entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
  /// The position of the currently-highlighted square. Always an open cell.
  pub pos: Pos,
  /// The current direction.
  pub direction: Direction,
}

impl Cursor {
  /// The first open square, across, unless that square has no across word.
  pub fn initial(topology: &Topology) -> Option<Self> {
    let pos = topology.first_open()?;
    Some(settle(
      topology,
      Self {
        pos,
        direction: Across,
      },
    ))
  }
}

/// An arrow key. Left/right force the cursor across, up/down force it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrow {
  Up,
  Down,
  Left,
  Right,
}

impl Arrow {
  fn delta(self) -> (isize, isize) {
    match self {
      Self::Up => (-1, 0),
      Self::Down => (1, 0),
      Self::Left => (0, -1),
      Self::Right => (0, 1),
    }
  }

  fn axis(self) -> Direction {
    match self {
      Self::Up | Self::Down => Down,
      Self::Left | Self::Right => Across,
    }
  }
}

/// Everything the user can do to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
  Arrow(Arrow),
  /// A click on a cell. `direction` is set when the click came from a clue
  /// whose direction should be adopted.
  Click {
    pos: Pos,
    direction: Option<Direction>,
  },
  /// A clue picked from the clue list.
  SelectClue { number: u32, direction: Direction },
  Letter(char),
  Backspace,
  Delete,
  /// Tab: the next clue in the current direction.
  NextClue,
  /// Shift+Tab: the previous clue in the current direction.
  PrevClue,
  /// Space: switch direction in place.
  Toggle,
}

/// A change to one cell of the [UserGrid]. `value` of `None` clears the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEdit {
  pub pos: Pos,
  pub value: Option<char>,
}

/// The result of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub cursor: Cursor,
  pub edit: Option<CellEdit>,
}

impl Transition {
  fn to(cursor: Cursor) -> Self {
    Self { cursor, edit: None }
  }

  fn with_edit(cursor: Cursor, pos: Pos, value: Option<char>) -> Self {
    Self {
      cursor,
      edit: Some(CellEdit { pos, value }),
    }
  }
}

/// Applies [Event]s to a [Cursor] for one puzzle.
#[derive(Debug, Clone, Copy)]
pub struct CursorController<'a> {
  topology: &'a Topology,
  clues: &'a ClueIndex,
}

impl<'a> CursorController<'a> {
  pub fn new(topology: &'a Topology, clues: &'a ClueIndex) -> Self {
    Self { topology, clues }
  }

  /// The clue the cursor is working on: the one in the cursor's direction whose
  /// span covers the cursor's square.
  pub fn active_clue(&self, cursor: Cursor) -> Option<&'a Clue> {
    self.clues.at_dir(cursor.pos, cursor.direction)
  }

  /// Computes the next cursor and cell edit for `event`. Events that make no
  /// sense in the current state (clicking a black square, moving off the grid,
  /// typing a non-letter) leave the cursor where it is and edit nothing.
  pub fn step(&self, cursor: Cursor, event: Event, grid: &UserGrid) -> Transition {
    let transition = match event {
      Event::Arrow(arrow) => self.arrow(cursor, arrow),
      Event::Click { pos, direction } => self.click(cursor, pos, direction),
      Event::SelectClue { number, direction } => self.select_clue(cursor, number, direction),
      Event::Letter(letter) => self.letter(cursor, letter),
      Event::Backspace => self.backspace(cursor, grid),
      Event::Delete => Transition::with_edit(cursor, cursor.pos, None),
      Event::NextClue => self.jump_clue(cursor, true),
      Event::PrevClue => self.jump_clue(cursor, false),
      Event::Toggle => self.toggle(cursor),
    };
    debug!(
      ?event,
      from = ?cursor,
      to = ?transition.cursor,
      edit = ?transition.edit,
      "cursor step"
    );
    transition
  }

  fn arrow(&self, cursor: Cursor, arrow: Arrow) -> Transition {
    match self
      .topology
      .offset(cursor.pos, arrow.delta())
      .filter(|&pos| self.topology.is_open(pos))
    {
      Some(pos) => Transition::to(Cursor {
        pos,
        direction: arrow.axis(),
      }),
      None => Transition::to(cursor),
    }
  }

  fn click(&self, cursor: Cursor, pos: Pos, supplied: Option<Direction>) -> Transition {
    let Some(cell) = self.topology.cell(pos).filter(|cell| !cell.is_black) else {
      return Transition::to(cursor);
    };

    let direction = match (supplied, cell.number) {
      (Some(direction), _) => direction,
      (None, None) => cursor.direction,
      (None, Some(_)) => match (cell.starts_across, cell.starts_down) {
        (true, true) if pos == cursor.pos => !cursor.direction,
        (true, false) => Across,
        (false, true) => Down,
        _ => cursor.direction,
      },
    };

    Transition::to(Cursor { pos, direction })
  }

  fn select_clue(&self, cursor: Cursor, number: u32, direction: Direction) -> Transition {
    match self.clues.get(number, direction) {
      Some(clue) => Transition::to(Cursor {
        pos: clue.anchor(),
        direction,
      }),
      None => Transition::to(cursor),
    }
  }

  /// Writes the letter and moves one square along the active word, but never
  /// past its last square.
  fn letter(&self, cursor: Cursor, letter: char) -> Transition {
    if !letter.is_ascii_alphabetic() || !self.topology.is_open(cursor.pos) {
      return Transition::to(cursor);
    }

    let next = self
      .topology
      .neighbor(cursor.pos, cursor.direction, true)
      .filter(|&next| {
        self
          .active_clue(cursor)
          .is_some_and(|clue| clue.covers(next, self.topology))
      });
    let moved = match next {
      Some(pos) => Cursor { pos, ..cursor },
      None => cursor,
    };

    Transition::with_edit(moved, cursor.pos, Some(letter.to_ascii_uppercase()))
  }

  /// Clears the current square if it has a letter. Otherwise steps back one square
  /// and clears that one.
  fn backspace(&self, cursor: Cursor, grid: &UserGrid) -> Transition {
    if !grid.is_empty(cursor.pos) {
      return Transition::with_edit(cursor, cursor.pos, None);
    }

    match self.topology.neighbor(cursor.pos, cursor.direction, false) {
      Some(pos) => Transition::with_edit(Cursor { pos, ..cursor }, pos, None),
      None => Transition::to(cursor),
    }
  }

  /// Moves to the anchor of the next (or previous) clue in the cursor's direction,
  /// wrapping around the list.
  fn jump_clue(&self, cursor: Cursor, forward: bool) -> Transition {
    let list: Vec<&Clue> = self.clues.list(cursor.direction).collect();
    if list.is_empty() {
      return Transition::to(cursor);
    }

    let current = self
      .active_clue(cursor)
      .and_then(|active| list.iter().position(|clue| *clue == active));

    let target = match current {
      Some(i) if forward => list[(i + 1) % list.len()],
      Some(i) => list[(i + list.len() - 1) % list.len()],
      None => self.nearest_clue(&list, cursor.pos, forward),
    };

    Transition::to(Cursor {
      pos: target.anchor(),
      direction: cursor.direction,
    })
  }

  /// With no active clue to step from, picks the first clue anchored after `pos`
  /// in reading order (or the last one before it), wrapping around.
  fn nearest_clue<'c>(&self, list: &[&'c Clue], pos: Pos, forward: bool) -> &'c Clue {
    let size = self.topology.size();
    let order = |(r, c): Pos| r * size + c;

    let found = if forward {
      list.iter().find(|clue| order(clue.anchor()) > order(pos))
    } else {
      list.iter().rev().find(|clue| order(clue.anchor()) < order(pos))
    };
    match (found, forward) {
      (Some(clue), _) => clue,
      (None, true) => list[0],
      (None, false) => list[list.len() - 1],
    }
  }

  /// Switches direction if the current square starts words both ways.
  fn toggle(&self, cursor: Cursor) -> Transition {
    match self.topology.cell(cursor.pos) {
      Some(cell) if cell.starts_across && cell.starts_down => Transition::to(Cursor {
        direction: !cursor.direction,
        ..cursor
      }),
      _ => Transition::to(cursor),
    }
  }
}

/// Keeps the cursor in a direction that has a word at its square: if there is no
/// word through the square in the cursor's direction but there is one the other
/// way, switch.
fn settle(topology: &Topology, cursor: Cursor) -> Cursor {
  if !topology.in_word(cursor.pos, cursor.direction) && topology.in_word(cursor.pos, !cursor.direction)
  {
    Cursor {
      direction: !cursor.direction,
      ..cursor
    }
  } else {
    cursor
  }
}
