use crossword::{Puzzle, STANDARD_SIZE};
use std::env;
use std::fs;
use std::io;
use std::path::Path;

fn check(path: &Path, size: usize) -> Result<Puzzle, String> {
  let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
  Puzzle::from_json(&text, size).map_err(|e| e.to_string())
}

fn report(path: &Path, size: usize) -> bool {
  match check(path, size) {
    Ok(puzzle) => {
      let title = puzzle.info().title.as_deref().unwrap_or("untitled");
      println!(
        "Loaded '{}' ({} clues) from {}",
        title,
        puzzle.clues().len(),
        path.display()
      );
      true
    }
    Err(e) => {
      println!("Failed with {} from {}", e, path.display());
      false
    }
  }
}

/// Checks puzzle JSON documents: one file, or every `.json` file in a directory.
/// An optional second argument overrides the grid size.
fn main() -> io::Result<()> {
  let args: Vec<String> = env::args().collect();
  let Some(path) = args.get(1).map(Path::new) else {
    eprintln!("usage: crossword <PUZZLE.json | DIR> [SIZE]");
    std::process::exit(2);
  };
  let size = match args.get(2).map(|s| s.parse::<usize>()) {
    None => STANDARD_SIZE,
    Some(Ok(size)) => size,
    Some(Err(e)) => {
      eprintln!("invalid size: {}", e);
      std::process::exit(2);
    }
  };

  if !fs::metadata(path)?.is_dir() {
    if !report(path, size) {
      std::process::exit(1);
    }
    return Ok(());
  }

  let mut success = 0;
  let mut failure = 0;
  for entry in fs::read_dir(path)? {
    let path = entry?.path();
    if path.extension().is_some_and(|ext| ext == "json") {
      if report(&path, size) {
        success += 1;
      } else {
        failure += 1;
      }
    }
  }
  println!("{} loaded, {} failed", success, failure);
  if failure > 0 {
    std::process::exit(1);
  }
  Ok(())
}
