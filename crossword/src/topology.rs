use crate::Direction::{self, Across, Down};
use crate::{Pos, PuzzleLayout};

/// A derived grid cell: where it is, whether it is black, and whether it starts
/// a word (and so carries a clue number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
  pub row: usize,
  pub col: usize,
  pub is_black: bool,
  /// Present only on cells that start an across or down word.
  pub number: Option<u32>,
  pub starts_across: bool,
  pub starts_down: bool,
}

impl Cell {
  pub fn pos(&self) -> Pos {
    (self.row, self.col)
  }

  /// Whether this cell is the first square of a word in `direction`.
  pub fn starts(&self, direction: Direction) -> bool {
    match direction {
      Across => self.starts_across,
      Down => self.starts_down,
    }
  }
}

/// The cell matrix derived from a [PuzzleLayout]: black squares, word starts and
/// crossword numbering. A pure function of the layout; rebuilding from the same
/// layout gives an identical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
  size: usize,
  cells: Vec<Cell>,
}

impl Topology {
  pub fn new(layout: &PuzzleLayout) -> Self {
    let size = layout.size();
    let mut cells = Vec::with_capacity(size * size);
    let mut next_number = 1;

    for (row, col) in Positions::new(size) {
      let is_black = layout.is_black((row, col));
      let starts_across = starts(layout, (row, col), Across);
      let starts_down = starts(layout, (row, col), Down);

      // A cell starting both words takes a single number shared by both clues.
      let number = if starts_across || starts_down {
        next_number += 1;
        Some(next_number - 1)
      } else {
        None
      };

      cells.push(Cell {
        row,
        col,
        is_black,
        number,
        starts_across,
        starts_down,
      });
    }

    Self { size, cells }
  }

  /// The number of rows, which is also the number of columns.
  pub fn size(&self) -> usize {
    self.size
  }

  /// The cell at `pos`, or `None` if `pos` is outside the grid.
  pub fn cell(&self, (r, c): Pos) -> Option<&Cell> {
    if r < self.size && c < self.size {
      Some(&self.cells[r * self.size + c])
    } else {
      None
    }
  }

  /// All cells, row-major.
  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  /// Iterates the cell matrix one row at a time.
  pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
    self.cells.chunks(self.size)
  }

  /// An iterator over all the positions of this grid, from left to right and top to bottom.
  pub fn positions(&self) -> Positions {
    Positions::new(self.size)
  }

  /// Whether `pos` is inside the grid and not black.
  pub fn is_open(&self, pos: Pos) -> bool {
    self.cell(pos).is_some_and(|cell| !cell.is_black)
  }

  /// The first open cell in reading order.
  pub fn first_open(&self) -> Option<Pos> {
    self.positions().find(|&p| self.is_open(p))
  }

  /// The position `delta` away from `pos`, if it is still inside the grid.
  pub fn offset(&self, (r, c): Pos, (dr, dc): (isize, isize)) -> Option<Pos> {
    let r = r.checked_add_signed(dr)?;
    let c = c.checked_add_signed(dc)?;
    (r < self.size && c < self.size).then_some((r, c))
  }

  /// The open cell immediately after (or before, when `forward` is false) `pos`
  /// in `direction`. Never skips over a black square.
  pub fn neighbor(&self, pos: Pos, direction: Direction, forward: bool) -> Option<Pos> {
    let (dr, dc) = direction.delta();
    let delta = if forward { (dr, dc) } else { (-dr, -dc) };
    self.offset(pos, delta).filter(|&p| self.is_open(p))
  }

  /// Walks back from `pos` to the first square of the word running through it
  /// in `direction`. `None` if `pos` is black or is not part of any word in that
  /// direction (a run of one).
  pub fn word_start(&self, pos: Pos, direction: Direction) -> Option<Pos> {
    if !self.is_open(pos) {
      return None;
    }
    let mut start = pos;
    while let Some(prev) = self.neighbor(start, direction, false) {
      start = prev;
    }
    self.cell(start).filter(|c| c.starts(direction)).map(Cell::pos)
  }

  /// Whether `pos` belongs to a word in `direction`.
  pub fn in_word(&self, pos: Pos, direction: Direction) -> bool {
    self.word_start(pos, direction).is_some()
  }

  /// The number of consecutive open cells starting at `pos` in `direction`,
  /// counting `pos` itself.
  pub fn run_len(&self, pos: Pos, direction: Direction) -> usize {
    if !self.is_open(pos) {
      return 0;
    }
    let mut len = 1;
    let mut at = pos;
    while let Some(next) = self.neighbor(at, direction, true) {
      len += 1;
      at = next;
    }
    len
  }
}

/// Whether `pos` starts a word in `direction`: it is open, the square before it is
/// black or off the grid, and the square after it is open.
fn starts(layout: &PuzzleLayout, (row, col): Pos, direction: Direction) -> bool {
  if layout.is_black((row, col)) {
    return false;
  }
  let (before_black, after) = match direction {
    Across => (col == 0 || layout.is_black((row, col - 1)), (row, col + 1)),
    Down => (row == 0 || layout.is_black((row - 1, col)), (row + 1, col)),
  };
  before_black && !layout.is_black(after)
}

/// Iterator over all the positions in a square grid, row-major.
#[derive(Debug, Clone)]
pub struct Positions {
  pos: Pos,
  size: usize,
}

impl Positions {
  fn new(size: usize) -> Self {
    Self { pos: (0, 0), size }
  }
}

impl Iterator for Positions {
  type Item = Pos;
  fn next(&mut self) -> Option<Self::Item> {
    let (row, col) = self.pos;

    if row >= self.size {
      return None;
    }

    if col + 1 >= self.size {
      self.pos = (row + 1, 0);
    } else {
      self.pos = (row, col + 1);
    }

    Some((row, col))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn basic_topology() -> Topology {
    let layout = PuzzleLayout::from_rows(&["--.-", "--.-", "-.--", "----"]).unwrap();
    Topology::new(&layout)
  }

  #[test]
  fn grid_starts() {
    let topology = basic_topology();

    let across_starts = [(0, 0), (1, 0), (2, 2), (3, 0)];
    let down_starts = [(0, 0), (0, 1), (0, 3), (2, 2)];

    for pos in topology.positions() {
      let cell = topology.cell(pos).unwrap();
      assert_eq!(cell.starts_across, across_starts.contains(&pos), "{:?}", pos);
      assert_eq!(cell.starts_down, down_starts.contains(&pos), "{:?}", pos);
    }
  }

  #[test]
  fn numbering_is_row_major_and_shared() {
    let topology = basic_topology();
    let numbered: Vec<(Pos, u32)> = topology
      .cells()
      .iter()
      .filter_map(|c| c.number.map(|n| (c.pos(), n)))
      .collect();

    assert_eq!(
      numbered,
      vec![
        ((0, 0), 1),
        ((0, 1), 2),
        ((0, 3), 3),
        ((1, 0), 4),
        ((2, 2), 5),
        ((3, 0), 6),
      ]
    );
  }

  #[test]
  fn single_cell_runs_get_no_number_from_that_direction() {
    // (0, 4) is boxed in across but starts a down word; (0, 0) is boxed in
    // both ways.
    let layout = PuzzleLayout::from_rows(&["-.-.-", "....-", "-----", ".-...", "--..."]).unwrap();
    let topology = Topology::new(&layout);

    let corner = topology.cell((0, 0)).unwrap();
    assert!(!corner.starts_across && !corner.starts_down);
    assert_eq!(corner.number, None);

    let column_start = topology.cell((0, 4)).unwrap();
    assert!(!column_start.starts_across);
    assert!(column_start.starts_down);
    assert_eq!(column_start.number, Some(1));

    assert_eq!(topology.cell((2, 0)).unwrap().number, Some(2));
    assert!(topology.cell((2, 1)).unwrap().starts_down);
  }

  #[test]
  fn rebuilding_is_idempotent() {
    let layout = PuzzleLayout::from_rows(&["--.-", "--.-", "-.--", "----"]).unwrap();
    assert_eq!(Topology::new(&layout), Topology::new(&layout));
  }

  #[test]
  fn word_walking() {
    let topology = basic_topology();

    assert_eq!(topology.word_start((0, 1), Across), Some((0, 0)));
    assert_eq!(topology.word_start((3, 3), Down), Some((0, 3)));
    assert_eq!(topology.word_start((0, 3), Across), None);
    assert_eq!(topology.word_start((0, 2), Across), None);

    assert_eq!(topology.run_len((3, 0), Across), 4);
    assert_eq!(topology.run_len((0, 1), Down), 2);
    assert_eq!(topology.run_len((0, 2), Down), 0);

    assert_eq!(topology.neighbor((0, 1), Across, true), None);
    assert_eq!(topology.neighbor((0, 0), Across, false), None);
    assert_eq!(topology.neighbor((1, 1), Down, false), Some((0, 1)));
    assert_eq!(topology.offset((0, 0), (-1, 0)), None);
    assert_eq!(topology.offset((3, 3), (0, 1)), None);
  }
}
