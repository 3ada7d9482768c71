use crate::{Error, Pos};
use serde::Deserialize;
use std::fmt::{Debug, Display};

/// The glyph marking a blocked cell in puzzle documents.
pub const BLACK_MARKER: char = '.';

/// One cell of a puzzle layout.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Glyph {
  /// A black square where nothing can be entered.
  Black,
  /// An open square whose letter is not given by the layout.
  Blank,
  /// An open square, with the solution letter it carries in the layout.
  Letter(char),
}

impl Glyph {
  /// Whether this is [Glyph::Black].
  pub fn is_black(&self) -> bool {
    *self == Self::Black
  }

  /// Whether this is not a black square.
  pub fn is_white(&self) -> bool {
    !self.is_black()
  }

  /// The solution letter, if the layout carries one.
  pub fn letter(&self) -> Option<char> {
    match self {
      Self::Letter(c) => Some(*c),
      _ => None,
    }
  }
}

impl From<&str> for Glyph {
  fn from(value: &str) -> Self {
    match value.trim().chars().next() {
      Some(BLACK_MARKER) => Self::Black,
      Some(c) if c.is_ascii_alphabetic() => Self::Letter(c.to_ascii_uppercase()),
      _ => Self::Blank,
    }
  }
}

impl Debug for Glyph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Black => write!(f, "■"),
      Self::Blank => write!(f, " "),
      Self::Letter(c) => write!(f, "{}", c),
    }
  }
}

impl Display for Glyph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// A grid the way puzzle sources hand it over. Sources disagree on the shape, so
/// this is normalized into a flat, row-major list of cells before anything else
/// looks at it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawGrid {
  /// `["C", "A", ".", ...]`
  Flat(Vec<String>),
  /// `[["C", "A", "."], ...]`
  Nested(Vec<Vec<String>>),
  /// Either of the above encoded as a JSON string, or a plain string with one
  /// character per cell.
  Encoded(String),
}

impl RawGrid {
  /// Flattens this grid into `size * size` cell strings, row-major.
  pub fn normalize(self, size: usize) -> Result<Vec<String>, Error> {
    match self {
      Self::Flat(cells) => Ok(cells),
      Self::Nested(rows) => {
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
          return Err(Error::MalformedGrid(format!(
            "row {} has {} cells, expected {}",
            row,
            cells.len(),
            size
          )));
        }
        Ok(rows.into_iter().flatten().collect())
      }
      Self::Encoded(text) => {
        if text.trim_start().starts_with('[') {
          match serde_json::from_str::<RawGrid>(&text) {
            Ok(Self::Encoded(_)) => Err(Error::MalformedGrid("grid is encoded twice".to_string())),
            Ok(inner) => inner.normalize(size),
            Err(e) => Err(Error::MalformedGrid(e.to_string())),
          }
        } else {
          Ok(
            text
              .chars()
              .filter(|c| *c != '\n' && *c != '\r')
              .map(String::from)
              .collect(),
          )
        }
      }
    }
  }
}

/// The black/white pattern of a square puzzle, as a flat row-major sequence of
/// glyphs. Immutable once built.
#[derive(Clone, Eq, PartialEq)]
pub struct PuzzleLayout {
  size: usize,
  glyphs: Vec<Glyph>,
}

impl PuzzleLayout {
  /// Normalizes a raw grid and checks it has `size * size` cells.
  pub fn parse(raw: RawGrid, size: usize) -> Result<Self, Error> {
    Self::from_glyphs(raw.normalize(size)?, size)
  }

  /// Builds a layout from a flat sequence of cell strings.
  pub fn from_glyphs<I, S>(cells: I, size: usize) -> Result<Self, Error>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let glyphs: Vec<Glyph> = cells.into_iter().map(|s| Glyph::from(s.as_ref())).collect();
    if glyphs.len() != size * size {
      return Err(Error::LayoutLength {
        expected: size * size,
        actual: glyphs.len(),
      });
    }
    Ok(Self { size, glyphs })
  }

  /// Builds a layout from one string per row, one character per cell.
  pub fn from_rows(rows: &[&str]) -> Result<Self, Error> {
    let cells = rows.iter().flat_map(|row| row.chars().map(String::from));
    Self::from_glyphs(cells, rows.len())
  }

  /// The number of rows, which is also the number of columns.
  pub fn size(&self) -> usize {
    self.size
  }

  /// The glyph at `pos`, or `None` if `pos` is outside the grid.
  pub fn get(&self, (r, c): Pos) -> Option<Glyph> {
    if r < self.size && c < self.size {
      Some(self.glyphs[r * self.size + c])
    } else {
      None
    }
  }

  /// Whether `pos` is a black square. Positions outside the grid count as black.
  pub fn is_black(&self, pos: Pos) -> bool {
    self.get(pos).is_none_or(|g| g.is_black())
  }

  pub fn glyphs(&self) -> &[Glyph] {
    &self.glyphs
  }
}

impl Debug for PuzzleLayout {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for row in self.glyphs.chunks(self.size) {
      for glyph in row {
        write!(f, "{}", glyph)?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

impl Display for PuzzleLayout {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "\n{:?}", self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn glyphs_from_strings() {
    assert_eq!(Glyph::from("."), Glyph::Black);
    assert_eq!(Glyph::from("a"), Glyph::Letter('A'));
    assert_eq!(Glyph::from(""), Glyph::Blank);
    assert_eq!(Glyph::from("-"), Glyph::Blank);
    assert_eq!(Glyph::from(" "), Glyph::Blank);
    // Only letters that can be typed count as solution letters.
    assert_eq!(Glyph::from("ñ"), Glyph::Blank);
  }

  #[test]
  fn every_grid_shape_normalizes_the_same() {
    let flat: RawGrid = serde_json::from_str(r#"["C","A","T","O",".","O","W","O","E"]"#).unwrap();
    let nested: RawGrid =
      serde_json::from_str(r#"[["C","A","T"],["O",".","O"],["W","O","E"]]"#).unwrap();
    let encoded: RawGrid =
      serde_json::from_str(r#""[\"C\",\"A\",\"T\",\"O\",\".\",\"O\",\"W\",\"O\",\"E\"]""#).unwrap();
    let plain: RawGrid = serde_json::from_str(r#""CATO.OWOE""#).unwrap();

    let expected = PuzzleLayout::from_rows(&["CAT", "O.O", "WOE"]).unwrap();
    for raw in [flat, nested, encoded, plain] {
      assert_eq!(PuzzleLayout::parse(raw, 3).unwrap(), expected);
    }
  }

  #[test]
  fn wrong_length_is_rejected() {
    let raw = RawGrid::Encoded("CATO.OWO".to_string());
    assert!(matches!(
      PuzzleLayout::parse(raw, 3),
      Err(Error::LayoutLength {
        expected: 9,
        actual: 8
      })
    ));
  }

  #[test]
  fn ragged_rows_are_rejected() {
    let raw = RawGrid::Nested(vec![
      vec!["A".into(), "B".into()],
      vec!["C".into(), "D".into(), "E".into()],
      vec!["F".into(), "G".into(), "H".into(), "I".into()],
    ]);
    assert!(matches!(PuzzleLayout::parse(raw, 3), Err(Error::MalformedGrid(_))));
  }

  #[test]
  fn layout_display() {
    let layout = PuzzleLayout::from_rows(&["--.-", "--.-", "-.--", "----"]).unwrap();

    #[rustfmt::skip]
    assert_eq!(
      layout.to_string(),
      concat!(
        "\n",
        "  ■ \n",
        "  ■ \n",
        " ■  \n",
        "    \n",
      )
    );
    assert!(layout.is_black((0, 2)));
    assert!(layout.is_black((4, 0)));
    assert!(!layout.is_black((3, 3)));
  }
}
