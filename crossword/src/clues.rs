use crate::Direction::{self, Across, Down};
use crate::{Error, Pos, Topology};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One clue of a puzzle, anchored at the first cell of its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
  pub number: u32,
  pub direction: Direction,
  pub text: String,
  pub answer: String,
  #[serde(alias = "anchorRow")]
  pub row: usize,
  #[serde(alias = "anchorColumn", alias = "col")]
  pub column: usize,
}

impl Clue {
  pub fn anchor(&self) -> Pos {
    (self.row, self.column)
  }

  /// The number of letters in the answer.
  pub fn len(&self) -> usize {
    self.answer.chars().count()
  }

  pub fn is_empty(&self) -> bool {
    self.answer.is_empty()
  }

  /// The cells this clue's answer occupies, in order.
  pub fn span(&self) -> impl Iterator<Item = Pos> + '_ {
    (0..self.len()).map(move |k| match self.direction {
      Across => (self.row, self.column + k),
      Down => (self.row + k, self.column),
    })
  }

  /// Whether `pos` lies in this clue's span, and no other word of the same
  /// direction starts strictly between the anchor and `pos`.
  pub fn covers(&self, pos: Pos, topology: &Topology) -> bool {
    let (r, c) = pos;
    let (offset, between): (usize, Vec<Pos>) = match self.direction {
      Across if r == self.row && c >= self.column => (
        c - self.column,
        (self.column + 1..c).map(|cc| (r, cc)).collect(),
      ),
      Down if c == self.column && r >= self.row => {
        (r - self.row, (self.row + 1..r).map(|rr| (rr, c)).collect())
      }
      _ => return false,
    };

    offset < self.len()
      && !between
        .into_iter()
        .any(|p| topology.cell(p).is_some_and(|cell| cell.starts(self.direction)))
  }
}

/// Lookup structures over a puzzle's clues, built once per load.
#[derive(Debug, Clone)]
pub struct ClueIndex {
  /// Across clues by number, then down clues by number.
  clues: Vec<Clue>,
  size: usize,
  by_key: HashMap<(u32, Direction), usize>,
  /// For each cell (row-major), the clues whose span covers it.
  by_cell: Vec<Vec<usize>>,
}

impl ClueIndex {
  /// Checks every clue against the topology and indexes it. A clue whose anchor
  /// does not carry its number, or whose answer does not fill the word's run,
  /// fails the whole build.
  pub fn build(topology: &Topology, clues: Vec<Clue>) -> Result<Self, Error> {
    let mut clues = clues;
    clues.sort_by_key(|clue| (clue.direction, clue.number));

    let mut by_key = HashMap::with_capacity(clues.len());
    let size = topology.size();
    let mut by_cell = vec![Vec::new(); size * size];

    for (i, clue) in clues.iter().enumerate() {
      let (number, direction) = (clue.number, clue.direction);

      let cell = topology
        .cell(clue.anchor())
        .filter(|cell| cell.number.is_some())
        .ok_or(Error::UnknownClueStart { number, direction })?;
      if cell.number != Some(number) || !cell.starts(direction) {
        return Err(Error::ClueAnchorMismatch {
          number,
          direction,
          row: clue.row,
          col: clue.column,
        });
      }

      let expected = topology.run_len(clue.anchor(), direction);
      if clue.len() != expected {
        return Err(Error::AnswerLength {
          number,
          direction,
          expected,
          actual: clue.len(),
        });
      }

      if by_key.insert((number, direction), i).is_some() {
        return Err(Error::DuplicateClue { number, direction });
      }

      for (r, c) in clue.span().filter(|&p| clue.covers(p, topology)) {
        by_cell[r * size + c].push(i);
      }
    }

    for cell in topology.cells() {
      for direction in [Across, Down] {
        let unclued = cell.number.is_some_and(|n| !by_key.contains_key(&(n, direction)));
        if cell.starts(direction) && unclued {
          warn!(row = cell.row, col = cell.col, %direction, "word has no clue");
        }
      }
    }

    Ok(Self {
      clues,
      size,
      by_key,
      by_cell,
    })
  }

  /// The clue with the given number and direction.
  pub fn get(&self, number: u32, direction: Direction) -> Option<&Clue> {
    self.by_key.get(&(number, direction)).map(|&i| &self.clues[i])
  }

  /// Every clue whose span covers `pos`.
  pub fn at(&self, pos: Pos) -> impl Iterator<Item = &Clue> {
    let (r, c) = pos;
    let slot = (r < self.size && c < self.size).then(|| &self.by_cell[r * self.size + c]);
    slot.into_iter().flatten().map(|&i| &self.clues[i])
  }

  /// The clue in `direction` whose span covers `pos`.
  pub fn at_dir(&self, pos: Pos, direction: Direction) -> Option<&Clue> {
    self.at(pos).find(|clue| clue.direction == direction)
  }

  /// Clues in `direction`, sorted by number.
  pub fn list(&self, direction: Direction) -> impl Iterator<Item = &Clue> {
    self.clues.iter().filter(move |clue| clue.direction == direction)
  }

  /// Across clues by number, then down clues by number.
  pub fn all(&self) -> &[Clue] {
    &self.clues
  }

  pub fn len(&self) -> usize {
    self.clues.len()
  }

  pub fn is_empty(&self) -> bool {
    self.clues.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::PuzzleLayout;

  fn clue(number: u32, direction: Direction, answer: &str, row: usize, column: usize) -> Clue {
    Clue {
      number,
      direction,
      text: format!("{} {}", number, direction),
      answer: answer.to_string(),
      row,
      column,
    }
  }

  fn topology() -> Topology {
    Topology::new(&PuzzleLayout::from_rows(&["CAT", "O.O", "WOE"]).unwrap())
  }

  fn clues() -> Vec<Clue> {
    vec![
      clue(3, Across, "WOE", 2, 0),
      clue(1, Down, "COW", 0, 0),
      clue(1, Across, "CAT", 0, 0),
      clue(2, Down, "TOE", 0, 2),
    ]
  }

  #[test]
  fn lookups() {
    let index = ClueIndex::build(&topology(), clues()).unwrap();

    assert_eq!(index.get(2, Down).unwrap().answer, "TOE");
    assert!(index.get(2, Across).is_none());

    let at_corner: Vec<&str> = index.at((0, 0)).map(|c| c.answer.as_str()).collect();
    assert_eq!(at_corner, vec!["CAT", "COW"]);
    assert_eq!(index.at_dir((2, 1), Across).unwrap().number, 3);
    assert!(index.at_dir((2, 1), Down).is_none());
    assert_eq!(index.at((1, 1)).count(), 0);
    assert_eq!(index.at((5, 5)).count(), 0);

    let across: Vec<u32> = index.list(Across).map(|c| c.number).collect();
    assert_eq!(across, vec![1, 3]);
  }

  #[test]
  fn spans_match_answers() {
    let topology = topology();
    let index = ClueIndex::build(&topology, clues()).unwrap();

    for clue in index.all() {
      let span: Vec<Pos> = clue.span().collect();
      assert_eq!(span.len(), clue.len());
      assert!(span.iter().all(|&p| topology.is_open(p)));
      assert!(span.iter().all(|&p| clue.covers(p, &topology)));
    }

    let down = index.get(2, Down).unwrap();
    assert_eq!(down.span().collect::<Vec<_>>(), vec![(0, 2), (1, 2), (2, 2)]);
    assert!(!down.covers((0, 1), &topology));
    assert!(!down.covers((3, 2), &topology));
  }

  #[test]
  fn covers_stops_at_a_later_word_start() {
    // The top row holds two across words; a clue claiming the whole row must not
    // reach past the second word's first square.
    let layout = PuzzleLayout::from_rows(&["--.--", "-----", "--.--", "-----", "--.--"]).unwrap();
    let topology = Topology::new(&layout);
    let too_long = clue(1, Across, "ABCDE", 0, 0);
    assert!(too_long.covers((0, 1), &topology));
    assert!(!too_long.covers((0, 4), &topology));
    assert!(!too_long.covers((1, 1), &topology));
  }

  #[test]
  fn unknown_start_is_rejected() {
    let mut bad = clues();
    bad.push(clue(4, Across, "AO", 0, 1));
    assert!(matches!(
      ClueIndex::build(&topology(), bad),
      Err(Error::UnknownClueStart {
        number: 4,
        direction: Across
      })
    ));
  }

  #[test]
  fn mismatched_anchor_is_rejected() {
    let mut bad = clues();
    bad[3] = clue(3, Down, "TOE", 0, 2);
    assert!(matches!(
      ClueIndex::build(&topology(), bad),
      Err(Error::ClueAnchorMismatch { number: 3, .. })
    ));

    // 3 starts only an across word.
    let mut bad = clues();
    bad.push(clue(3, Down, "W", 2, 0));
    assert!(matches!(
      ClueIndex::build(&topology(), bad),
      Err(Error::ClueAnchorMismatch { number: 3, .. })
    ));
  }

  #[test]
  fn wrong_answer_length_is_rejected() {
    let mut bad = clues();
    bad[2] = clue(1, Across, "CA", 0, 0);
    assert!(matches!(
      ClueIndex::build(&topology(), bad),
      Err(Error::AnswerLength {
        expected: 3,
        actual: 2,
        ..
      })
    ));
  }

  #[test]
  fn duplicates_are_rejected() {
    let mut bad = clues();
    bad.push(clue(1, Across, "CAT", 0, 0));
    assert!(matches!(
      ClueIndex::build(&topology(), bad),
      Err(Error::DuplicateClue { number: 1, .. })
    ));
  }

  #[test]
  fn clue_json_accepts_anchor_aliases() {
    let parsed: Clue = serde_json::from_str(
      r#"{"number": 2, "direction": "down", "text": "Digit", "answer": "TOE", "anchorRow": 0, "anchorColumn": 2}"#,
    )
    .unwrap();
    assert_eq!(parsed.anchor(), (0, 2));
    assert_eq!(parsed.direction, Down);
  }
}
