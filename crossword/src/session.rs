use crate::progress::{ProgressKey, ProgressSnapshot, ProgressStore, SnapshotError, StoreError};
use crate::{
  CellEdit, Clue, Cursor, CursorController, Event, Pos, Puzzle, Topology, UserGrid, is_solved,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// One open puzzle for one user: the puzzle, the letters entered so far, the
/// cursor and whether the grid is solved. Created when a puzzle is opened and
/// dropped when it is closed.
#[derive(Debug, Clone)]
pub struct Session {
  puzzle: Puzzle,
  grid: UserGrid,
  cursor: Cursor,
  solved: bool,
}

/// What one [Event] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update {
  /// The cursor moved or changed direction.
  pub moved: bool,
  /// The cell whose content changed, if any. Edits that leave a cell as it was
  /// are not reported.
  pub edit: Option<CellEdit>,
  /// Whether the grid is solved after the event.
  pub solved: bool,
  /// The event completed the puzzle.
  pub just_solved: bool,
}

/// Why a stored snapshot could not be resumed. A store failure leaves the grid
/// as it was; a rejected snapshot leaves it empty.
#[derive(Debug, Error)]
pub enum ResumeError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Snapshot(#[from] SnapshotError),
}

impl Session {
  /// Opens `puzzle` with an empty grid.
  pub fn new(puzzle: Puzzle) -> Self {
    let grid = puzzle.empty_grid();
    let cursor = puzzle.start();
    Self {
      puzzle,
      grid,
      cursor,
      solved: false,
    }
  }

  /// Replaces the grid with a stored snapshot. A snapshot of the wrong size is
  /// rejected and the session falls back to an empty grid.
  pub fn restore(&mut self, snapshot: &ProgressSnapshot) -> Result<(), SnapshotError> {
    let grid = match UserGrid::from_rows(&snapshot.grid, self.puzzle.topology()) {
      Ok(grid) => grid,
      Err(e) => {
        warn!(error = %e, "rejected progress snapshot");
        self.grid = self.puzzle.empty_grid();
        self.solved = false;
        return Err(e);
      }
    };
    self.grid = grid;
    self.solved = is_solved(&self.grid, self.puzzle.solution());
    info!(filled = self.grid.filled(), solved = self.solved, "restored progress");
    Ok(())
  }

  /// Loads and restores this user's stored progress. Returns whether anything
  /// was restored.
  pub fn resume<S: ProgressStore>(&mut self, store: &S, key: &ProgressKey) -> Result<bool, ResumeError> {
    let snapshot = store.load(key).inspect_err(|e| {
      warn!(error = %e, user = %key.user, puzzle = %key.puzzle, "could not load progress");
    })?;
    match snapshot {
      Some(snapshot) => {
        self.restore(&snapshot)?;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  /// Runs one event through the cursor state machine and applies its edit.
  /// Completion is rechecked after every change to the grid.
  pub fn apply(&mut self, event: Event) -> Update {
    let transition = self.controller().step(self.cursor, event, &self.grid);

    let moved = transition.cursor != self.cursor;
    self.cursor = transition.cursor;

    let edit = transition.edit.filter(|edit| {
      self.puzzle.topology().is_open(edit.pos) && self.grid.set(edit.pos, edit.value)
    });

    let was_solved = self.solved;
    if edit.is_some() {
      self.solved = is_solved(&self.grid, self.puzzle.solution());
      if self.solved && !was_solved {
        info!(id = ?self.puzzle.info().id, "puzzle solved");
      }
    }

    debug!(?event, moved, ?edit, solved = self.solved, "applied event");
    Update {
      moved,
      edit,
      solved: self.solved,
      just_solved: self.solved && !was_solved,
    }
  }

  fn controller(&self) -> CursorController<'_> {
    CursorController::new(self.puzzle.topology(), self.puzzle.clues())
  }

  pub fn puzzle(&self) -> &Puzzle {
    &self.puzzle
  }

  /// The derived cell matrix.
  pub fn cells(&self) -> &Topology {
    self.puzzle.topology()
  }

  pub fn cursor(&self) -> Cursor {
    self.cursor
  }

  /// The clue under the cursor in the cursor's direction. Always derived from
  /// the cursor, never stored.
  pub fn active_clue(&self) -> Option<&Clue> {
    self.controller().active_clue(self.cursor)
  }

  /// The squares of the active clue.
  pub fn active_span(&self) -> Vec<Pos> {
    self
      .active_clue()
      .map(|clue| clue.span().collect())
      .unwrap_or_default()
  }

  pub fn user_grid(&self) -> &UserGrid {
    &self.grid
  }

  pub fn is_solved(&self) -> bool {
    self.solved
  }

  /// The grid as it should be handed to the store. The store fills in the
  /// timestamp.
  pub fn snapshot(&self) -> ProgressSnapshot {
    ProgressSnapshot {
      grid: self.grid.to_rows(),
      completed: self.solved,
      last_played_at: None,
    }
  }
}
