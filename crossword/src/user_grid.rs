use crate::progress::SnapshotError;
use crate::{Pos, Topology};
use std::fmt::Debug;

/// The letters the user has entered, one slot per cell. Black squares are never
/// written; `None` means unfilled.
#[derive(Clone, PartialEq, Eq)]
pub struct UserGrid {
  size: usize,
  entries: Vec<Option<char>>,
}

impl UserGrid {
  /// An unfilled `size` by `size` grid.
  pub fn new(size: usize) -> Self {
    Self {
      size,
      entries: vec![None; size * size],
    }
  }

  pub fn size(&self) -> usize {
    self.size
  }

  /// The letter at `pos`, if one has been entered.
  pub fn get(&self, (r, c): Pos) -> Option<char> {
    if r < self.size && c < self.size {
      self.entries[r * self.size + c]
    } else {
      None
    }
  }

  pub fn is_empty(&self, pos: Pos) -> bool {
    self.get(pos).is_none()
  }

  /// Writes `value` at `pos`. Returns whether the content changed.
  pub(crate) fn set(&mut self, (r, c): Pos, value: Option<char>) -> bool {
    if r >= self.size || c >= self.size {
      return false;
    }
    let slot = &mut self.entries[r * self.size + c];
    let changed = *slot != value;
    *slot = value;
    changed
  }

  /// How many cells hold a letter.
  pub fn filled(&self) -> usize {
    self.entries.iter().flatten().count()
  }

  /// The grid as rows of one-letter strings, with `""` for unfilled cells. This
  /// is the shape progress snapshots are stored in.
  pub fn to_rows(&self) -> Vec<Vec<String>> {
    self
      .entries
      .chunks(self.size)
      .map(|row| row.iter().map(|e| e.map(String::from).unwrap_or_default()).collect())
      .collect()
  }

  /// Rebuilds a grid from stored rows. The rows must match the puzzle's size
  /// exactly. Entries on black squares are dropped, and each entry is reduced to
  /// its first letter, uppercased.
  pub fn from_rows(rows: &[Vec<String>], topology: &Topology) -> Result<Self, SnapshotError> {
    let size = topology.size();
    if rows.len() != size || rows.iter().any(|row| row.len() != size) {
      return Err(SnapshotError::Dimensions {
        expected: size,
        rows: rows.len(),
        cols: rows.iter().map(Vec::len).max().unwrap_or(0),
      });
    }

    let mut grid = Self::new(size);
    for (r, row) in rows.iter().enumerate() {
      for (c, entry) in row.iter().enumerate() {
        if topology.is_open((r, c)) {
          let letter = entry.chars().find(|ch| ch.is_alphabetic());
          grid.set((r, c), letter.map(|ch| ch.to_ascii_uppercase()));
        }
      }
    }
    Ok(grid)
  }
}

impl Debug for UserGrid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for row in self.entries.chunks(self.size) {
      for entry in row {
        write!(f, "{}", entry.unwrap_or('·'))?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}
