use crossword::Direction::{Across, Down};
use crossword::progress::ProgressSnapshot;
use crossword::{Arrow, Event, Puzzle, STANDARD_SIZE, Session, UserGrid, is_solved};
use proptest::prelude::*;

const MINI: &str = include_str!("data/mini.json");
const DAILY: &str = include_str!("data/daily.json");

fn mini() -> Puzzle {
  Puzzle::from_json(MINI, 5).unwrap()
}

fn daily() -> Puzzle {
  Puzzle::from_json(DAILY, STANDARD_SIZE).unwrap()
}

fn event(size: usize) -> impl Strategy<Value = Event> {
  let pos = (0..size + 2, 0..size + 2);
  prop_oneof![
    prop_oneof![
      Just(Arrow::Up),
      Just(Arrow::Down),
      Just(Arrow::Left),
      Just(Arrow::Right)
    ]
    .prop_map(Event::Arrow),
    (pos, prop::option::of(prop_oneof![Just(Across), Just(Down)]))
      .prop_map(|(pos, direction)| Event::Click { pos, direction }),
    (1u32..40, prop_oneof![Just(Across), Just(Down)])
      .prop_map(|(number, direction)| Event::SelectClue { number, direction }),
    any::<char>().prop_map(Event::Letter),
    prop::char::range('A', 'Z').prop_map(Event::Letter),
    Just(Event::Backspace),
    Just(Event::Delete),
    Just(Event::NextClue),
    Just(Event::PrevClue),
    Just(Event::Toggle),
  ]
}

#[test]
fn standard_grid_loads() {
  let puzzle = daily();
  let topology = puzzle.topology();

  for clue in puzzle.clues().all() {
    let span: Vec<_> = clue.span().collect();
    assert_eq!(span.len(), clue.answer.len());
    assert!(span.iter().all(|&p| topology.is_open(p)));
    for &p in &span[1..] {
      assert!(!topology.cell(p).unwrap().starts(clue.direction));
    }
  }

  assert_eq!(Puzzle::from_json(DAILY, STANDARD_SIZE).unwrap().topology(), topology);
}

#[test]
fn every_open_cell_has_a_word() {
  for puzzle in [mini(), daily()] {
    let topology = puzzle.topology();
    for cell in topology.cells().iter().filter(|c| !c.is_black) {
      let clues = puzzle.clues().at(cell.pos()).count();
      assert!(clues >= 1, "{:?} is in no clue", cell.pos());
    }
  }
}

#[test]
fn solving_by_typing_every_clue() {
  let puzzle = daily();
  let mut session = Session::new(puzzle.clone());

  for clue in puzzle.clues().all() {
    session.apply(Event::SelectClue {
      number: clue.number,
      direction: clue.direction,
    });
    for letter in clue.answer.chars() {
      session.apply(Event::Letter(letter));
    }
  }

  assert!(session.is_solved());
  let snapshot = session.snapshot();
  assert!(snapshot.completed);
  let json = snapshot.to_json().unwrap();
  assert_eq!(ProgressSnapshot::from_json(&json).unwrap(), snapshot);
}

#[test]
fn snapshot_from_another_puzzle_size_is_rejected() {
  let mut session = Session::new(mini());
  let daily = Session::new(daily());
  assert!(session.restore(&daily.snapshot()).is_err());
  assert_eq!(session.user_grid(), &UserGrid::new(5));
}

proptest! {
  #[test]
  fn cursor_stays_on_open_cells(events in prop::collection::vec(event(5), 0..200)) {
    let mut session = Session::new(mini());
    for event in events {
      session.apply(event);
      let pos = session.cursor().pos;
      prop_assert!(session.cells().is_open(pos), "cursor on {:?} after {:?}", pos, event);
    }
  }

  #[test]
  fn cursor_stays_on_open_cells_in_a_standard_grid(
    events in prop::collection::vec(event(STANDARD_SIZE), 0..300)
  ) {
    let mut session = Session::new(daily());
    for event in events {
      session.apply(event);
      prop_assert!(session.cells().is_open(session.cursor().pos));
    }
  }

  #[test]
  fn black_cells_are_never_written(events in prop::collection::vec(event(5), 0..200)) {
    let mut session = Session::new(mini());
    for event in events {
      session.apply(event);
    }
    let topology = session.cells();
    for cell in topology.cells().iter().filter(|c| c.is_black) {
      prop_assert_eq!(session.user_grid().get(cell.pos()), None);
    }
  }

  #[test]
  fn completion_ignores_fill_order(order in Just((0..25).collect::<Vec<usize>>()).prop_shuffle()) {
    let puzzle = mini();
    let mut session = Session::new(puzzle.clone());
    for i in order {
      let pos = (i / 5, i % 5);
      if let Some(letter) = puzzle.solution().get(pos) {
        session.apply(Event::Click { pos, direction: None });
        session.apply(Event::Delete);
        session.apply(Event::Letter(letter));
      }
    }
    prop_assert!(session.is_solved());
    prop_assert!(is_solved(session.user_grid(), puzzle.solution()));
  }
}
