use crate::{Clue, ClueIndex, Cursor, Error, Glyph, Pos, PuzzleLayout, RawGrid, Topology, UserGrid};
use serde::Deserialize;
use std::fmt::Display;
use tracing::info;

/// Puzzle identifiers are numeric in some sources and strings in others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PuzzleId {
  Number(u64),
  Text(String),
}

impl Display for PuzzleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{}", n),
      Self::Text(s) => write!(f, "{}", s),
    }
  }
}

/// A puzzle document as supplied by a puzzle source. Read-only input to
/// [Puzzle::load].
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleSource {
  #[serde(default)]
  pub id: Option<PuzzleId>,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub editor: Option<String>,
  #[serde(default)]
  pub publisher: Option<String>,
  #[serde(default, alias = "date_published")]
  pub date: Option<String>,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(alias = "layout")]
  pub grid: RawGrid,
  pub clues: Vec<Clue>,
  /// When absent, the letters in `grid` are the solution.
  #[serde(default)]
  pub solution: Option<RawGrid>,
}

impl PuzzleSource {
  pub fn from_json(text: &str) -> Result<Self, Error> {
    Ok(serde_json::from_str(text)?)
  }
}

/// Descriptive fields of a puzzle, carried through unchanged from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PuzzleInfo {
  pub id: Option<PuzzleId>,
  pub title: Option<String>,
  pub author: Option<String>,
  pub editor: Option<String>,
  pub publisher: Option<String>,
  pub date: Option<String>,
  pub difficulty: Option<String>,
  pub notes: Option<String>,
}

/// The solution letters of a puzzle, with `None` on black squares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
  size: usize,
  letters: Vec<Option<char>>,
}

impl Solution {
  /// Reads a solution grid. Every open cell must hold a letter.
  pub fn parse(raw: RawGrid, size: usize) -> Result<Self, Error> {
    let cells = raw.normalize(size)?;
    if cells.len() != size * size {
      return Err(Error::SolutionLength {
        expected: size * size,
        actual: cells.len(),
      });
    }
    Self::from_glyphs(cells.iter().map(|cell| Glyph::from(cell.as_str())), size)
  }

  /// Takes the solution from the letters written into the layout itself.
  pub fn from_layout(layout: &PuzzleLayout) -> Result<Self, Error> {
    Self::from_glyphs(layout.glyphs().iter().copied(), layout.size())
  }

  fn from_glyphs(glyphs: impl Iterator<Item = Glyph>, size: usize) -> Result<Self, Error> {
    let mut letters = Vec::with_capacity(size * size);
    for (i, glyph) in glyphs.enumerate() {
      letters.push(match glyph {
        Glyph::Black => None,
        Glyph::Letter(c) => Some(c),
        Glyph::Blank => {
          return Err(Error::SolutionMismatch {
            row: i / size,
            col: i % size,
          });
        }
      });
    }
    Ok(Self { size, letters })
  }

  pub fn size(&self) -> usize {
    self.size
  }

  /// The solution letter at `pos`; `None` for black squares and positions off
  /// the grid.
  pub fn get(&self, (r, c): Pos) -> Option<char> {
    if r < self.size && c < self.size {
      self.letters[r * self.size + c]
    } else {
      None
    }
  }

  /// Whether the solution marks `pos` as black.
  pub fn is_black(&self, pos: Pos) -> bool {
    self.get(pos).is_none()
  }
}

/// A fully checked puzzle: its layout, the derived cell matrix, the clue index
/// and the solution. Immutable; everything that changes while solving lives in a
/// [Session](crate::Session).
#[derive(Debug, Clone)]
pub struct Puzzle {
  info: PuzzleInfo,
  layout: PuzzleLayout,
  topology: Topology,
  clues: ClueIndex,
  solution: Solution,
  start: Cursor,
}

impl Puzzle {
  /// Normalizes and checks a puzzle document for a `size` by `size` grid. Any
  /// inconsistency between layout, solution and clues refuses the load.
  pub fn load(source: PuzzleSource, size: usize) -> Result<Self, Error> {
    let layout = PuzzleLayout::parse(source.grid, size)?;
    let solution = match source.solution {
      Some(raw) => Solution::parse(raw, size)?,
      None => Solution::from_layout(&layout)?,
    };

    let topology = Topology::new(&layout);
    for pos in topology.positions() {
      if layout.is_black(pos) != solution.is_black(pos) {
        let (row, col) = pos;
        return Err(Error::SolutionMismatch { row, col });
      }
    }

    let clues = ClueIndex::build(&topology, source.clues)?;
    for clue in clues.all() {
      let spelled = clue.span().map(|p| solution.get(p));
      if !spelled.eq(clue.answer.chars().map(|c| Some(c.to_ascii_uppercase()))) {
        return Err(Error::AnswerMismatch {
          number: clue.number,
          direction: clue.direction,
        });
      }
    }

    let start = Cursor::initial(&topology).ok_or(Error::NoOpenCells)?;

    let info = PuzzleInfo {
      id: source.id,
      title: source.title,
      author: source.author,
      editor: source.editor,
      publisher: source.publisher,
      date: source.date,
      difficulty: source.difficulty,
      notes: source.notes,
    };
    info!(id = ?info.id, size, clues = clues.len(), "loaded puzzle");

    Ok(Self {
      info,
      layout,
      topology,
      clues,
      solution,
      start,
    })
  }

  /// Decodes and loads a JSON puzzle document.
  pub fn from_json(text: &str, size: usize) -> Result<Self, Error> {
    Self::load(PuzzleSource::from_json(text)?, size)
  }

  pub fn info(&self) -> &PuzzleInfo {
    &self.info
  }

  pub fn layout(&self) -> &PuzzleLayout {
    &self.layout
  }

  pub fn topology(&self) -> &Topology {
    &self.topology
  }

  pub fn clues(&self) -> &ClueIndex {
    &self.clues
  }

  pub fn solution(&self) -> &Solution {
    &self.solution
  }

  pub fn size(&self) -> usize {
    self.layout.size()
  }

  /// Where the cursor starts when the puzzle is opened.
  pub fn start(&self) -> Cursor {
    self.start
  }

  /// An empty grid of the right size for this puzzle.
  pub fn empty_grid(&self) -> UserGrid {
    UserGrid::new(self.size())
  }
}
