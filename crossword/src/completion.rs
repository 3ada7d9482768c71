use crate::{Solution, UserGrid};

/// Whether `grid` solves the puzzle: every cell is either black in the solution
/// or holds the solution's letter. Letters compare case-insensitively. Grids of
/// the wrong size are simply unsolved.
pub fn is_solved(grid: &UserGrid, solution: &Solution) -> bool {
  let size = solution.size();
  if grid.size() != size {
    return false;
  }

  (0..size).all(|r| {
    (0..size).all(|c| match solution.get((r, c)) {
      None => true,
      Some(letter) => grid
        .get((r, c))
        .is_some_and(|entry| entry.eq_ignore_ascii_case(&letter)),
    })
  })
}
