use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
  self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
  MouseEvent, MouseEventKind,
};
use crossword::Direction::{self, Across, Down};
use crossword::progress::SaveDebouncer;
use crossword::{Arrow, Event, Pos, Session};
use ratatui::{
  DefaultTerminal, Frame,
  buffer::Buffer,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style, Stylize},
  text::{Line, Text},
  widgets::{Block, Padding, Paragraph, Widget},
};
use tracing::warn;

use crate::saver::{SaveOutcome, SaveWorker};

const SQUARE_WIDTH: u16 = 5;
const SQUARE_HEIGHT: u16 = 2;
const SQUARE_GAP: u16 = 1;
const CLUE_PANEL_WIDTH: u16 = 45;
const TICK: Duration = Duration::from_millis(100);

/// A message for the status line. Never blocks solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  Info(String),
  Warning(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SquareStyle {
  // Default styling
  Standard,
  // The cursor is positioned on this square.
  Cursor,
  // The cursor is not on this square, but the active clue includes it.
  Word,
  Black,
  Solved,
}

impl From<SquareStyle> for Style {
  fn from(value: SquareStyle) -> Self {
    let base_style = match value {
      SquareStyle::Standard => Style::new().bg(Color::White),
      SquareStyle::Cursor => Style::new().bg(Color::LightRed),
      SquareStyle::Word => Style::new().bg(Color::LightYellow),
      SquareStyle::Black => return Style::new().bg(Color::Black),
      SquareStyle::Solved => Style::new().bg(Color::LightGreen),
    };
    base_style.fg(Color::Black).add_modifier(Modifier::BOLD)
  }
}

/// Where each part of the screen goes for a given frame size.
#[derive(Debug, Clone, Copy)]
struct Areas {
  title: Rect,
  grid: Rect,
  current_clue: Rect,
  clue_list: Rect,
  status: Rect,
}

pub struct App {
  session: Session,
  debouncer: SaveDebouncer,
  saver: SaveWorker,
  notice: Option<Notice>,
  /// The frame size at the last draw, for mapping mouse clicks.
  frame_area: Rect,
  running: bool,
}

impl App {
  pub fn new(
    session: Session,
    debouncer: SaveDebouncer,
    saver: SaveWorker,
    notice: Option<Notice>,
  ) -> Self {
    Self {
      session,
      debouncer,
      saver,
      notice,
      frame_area: Rect::default(),
      running: true,
    }
  }

  pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
    self.running = true;
    while self.running {
      terminal.draw(|frame| self.draw(frame))?;
      if event::poll(TICK)? {
        self.handle_crossterm_events()?;
      }
      self.tick(Instant::now());
    }
    Ok(())
  }

  /// Saves whatever is still pending and stops the saver. Returns the reason
  /// if the last save did not make it.
  pub fn close(mut self) -> Option<String> {
    let mut failure = None;
    if let Some(snapshot) = self.debouncer.flush() {
      if self.saver.submit(snapshot).is_err() {
        warn!("saver stopped before the final save");
        failure = Some("progress saver stopped".to_owned());
      }
    }
    for outcome in self.saver.shutdown() {
      if let SaveOutcome::Failed { error, .. } = outcome {
        failure = Some(error);
      }
    }
    failure
  }

  fn draw(&mut self, frame: &mut Frame) {
    self.frame_area = frame.area();
    frame.render_widget(&*self, frame.area());
  }

  /// Reads the crossterm events and updates the state of [`App`].
  fn handle_crossterm_events(&mut self) -> io::Result<()> {
    match event::read()? {
      // it's important to check KeyEventKind::Press to avoid handling key release events
      TermEvent::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
      TermEvent::Mouse(mouse) => self.on_mouse_event(mouse),
      _ => {}
    }
    Ok(())
  }

  fn on_key_event(&mut self, key: KeyEvent) {
    if let Some(event) = key_event(key) {
      self.apply(event);
      return;
    }
    match (key.modifiers, key.code) {
      (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
        self.quit()
      }
      _ => {}
    }
  }

  fn on_mouse_event(&mut self, mouse: MouseEvent) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
      return;
    }
    let areas = self.areas(self.frame_area);
    if let Some(pos) = square_at(areas.grid, (mouse.column, mouse.row)) {
      self.apply(Event::Click {
        pos,
        direction: None,
      });
    } else if let Some((number, direction)) = self.clue_at(areas.clue_list, (mouse.column, mouse.row)) {
      self.apply(Event::SelectClue { number, direction });
    }
  }

  fn apply(&mut self, event: Event) {
    let update = self.session.apply(event);
    if update.edit.is_some() {
      self.debouncer.mark(self.session.snapshot(), Instant::now());
    }
    if update.just_solved {
      self.notice = Some(Notice::Info("Solved!".to_owned()));
    }
  }

  /// Collects finished saves and releases the next one when it is due.
  fn tick(&mut self, now: Instant) {
    let outcomes: Vec<SaveOutcome> = self.saver.outcomes().collect();
    for outcome in outcomes {
      match outcome {
        SaveOutcome::Saved(_) => {
          if matches!(self.notice, Some(Notice::Warning(_))) {
            self.notice = None;
          }
        }
        SaveOutcome::Failed { snapshot, error } => {
          self.notice = Some(Notice::Warning(format!("Could not save progress: {}", error)));
          self.debouncer.retry(snapshot, now);
        }
      }
    }

    if let Some(snapshot) = self.debouncer.poll(now) {
      if let Err(snapshot) = self.saver.submit(snapshot) {
        self.notice = Some(Notice::Warning("Progress saver stopped".to_owned()));
        self.debouncer.retry(snapshot, now);
      }
    }
  }

  /// Set running to false to quit the application.
  fn quit(&mut self) {
    self.running = false;
  }

  fn areas(&self, area: Rect) -> Areas {
    let [title, main, status] = Layout::vertical([
      Constraint::Length(2),
      Constraint::Fill(1),
      Constraint::Length(1),
    ])
    .areas(area);
    let [grid, side] =
      Layout::horizontal([Constraint::Fill(1), Constraint::Length(CLUE_PANEL_WIDTH)]).areas(main);
    let [current_clue, clue_list] =
      Layout::vertical([Constraint::Length(5), Constraint::Fill(1)]).areas(side);

    let (width, height) = grid_extent(self.session.cells().size());
    let grid = center(grid, Constraint::Length(width), Constraint::Length(height));
    Areas {
      title,
      grid,
      current_clue,
      clue_list,
      status,
    }
  }

  // Determines how a particular square should be styled.
  fn square_style(&self, pos: Pos, span: &[Pos]) -> SquareStyle {
    if !self.session.cells().is_open(pos) {
      SquareStyle::Black
    } else if self.session.is_solved() {
      SquareStyle::Solved
    } else if pos == self.session.cursor().pos {
      SquareStyle::Cursor
    } else if span.contains(&pos) {
      SquareStyle::Word
    } else {
      SquareStyle::Standard
    }
  }

  fn render_grid(&self, area: Rect, buf: &mut Buffer) {
    let span = self.session.active_span();
    let grid = self.session.user_grid();
    for cell in self.session.cells().cells() {
      let style = self.square_style(cell.pos(), &span);
      let square_area = square_rect(area, cell.pos());
      if square_area.is_empty() {
        continue;
      }

      let number = cell.number.map(|n| n.to_string()).unwrap_or_default();
      let letter = grid.get(cell.pos()).map(String::from).unwrap_or_default();
      Paragraph::new(vec![
        Line::from(number).dim(),
        Line::from(letter).centered(),
      ])
      .block(Block::new().style(style))
      .render(square_area, buf);
    }
  }

  fn current_clue(&self) -> Text<'_> {
    match self.session.active_clue() {
      Some(clue) => Text::from(vec![
        Line::from(format!("{}{}", clue.number, direction_letter(clue.direction))).bold(),
        Line::from(format!("{} ({})", clue.text, clue.len())),
      ]),
      None => Text::from("No clue here"),
    }
  }

  /// The clue panel, one entry per line. Headings and spacers carry no clue.
  fn clue_lines(&self) -> Vec<(Line<'_>, Option<(u32, Direction)>)> {
    let active = self
      .session
      .active_clue()
      .map(|clue| (clue.number, clue.direction));
    let mut lines = vec![];
    for direction in [Across, Down] {
      if !lines.is_empty() {
        lines.push((Line::default(), None));
      }
      let heading = match direction {
        Across => "Across",
        Down => "Down",
      };
      lines.push((Line::from(heading).bold().underlined(), None));
      for clue in self.session.puzzle().clues().list(direction) {
        let key = (clue.number, clue.direction);
        let line = Line::from(format!("{:>3} {}", clue.number, clue.text));
        let line = if active == Some(key) {
          line.reversed()
        } else {
          line
        };
        lines.push((line, Some(key)));
      }
    }
    lines
  }

  fn clue_at(&self, area: Rect, (column, row): (u16, u16)) -> Option<(u32, Direction)> {
    let inner = clue_list_block().inner(area);
    if column < inner.x || column >= inner.right() || row < inner.y || row >= inner.bottom() {
      return None;
    }
    let index = (row - inner.y) as usize;
    self.clue_lines().get(index).and_then(|(_, key)| *key)
  }

  fn status(&self) -> Line<'_> {
    match &self.notice {
      Some(Notice::Warning(message)) => Line::from(message.as_str()).red(),
      Some(Notice::Info(message)) => Line::from(message.as_str()).green(),
      None if self.session.is_solved() => Line::from("Solved!").green(),
      None => Line::from("Tab next clue, Space switch direction, Esc quit").dim(),
    }
  }
}

fn clue_list_block() -> Block<'static> {
  Block::bordered()
    .title(Line::from("Clues").centered())
    .padding(Padding::horizontal(1))
}

impl Widget for &App {
  fn render(self, area: Rect, buf: &mut Buffer) {
    let areas = self.areas(area);
    let info = self.session.puzzle().info();

    let mut title = vec![
      "Ratatui Crossword".bold().blue(),
      ": ".bold(),
      info.title.clone().unwrap_or_default().bold(),
    ];
    if let Some(author) = &info.author {
      title.push(format!(" by {}", author).into());
    }
    Line::from(title).centered().render(areas.title, buf);

    self.render_grid(areas.grid, buf);

    Paragraph::new(self.current_clue())
      .block(
        Block::bordered()
          .title(Line::from("Current clue").centered())
          .padding(Padding::horizontal(1)),
      )
      .render(areas.current_clue, buf);

    let lines: Vec<Line> = self.clue_lines().into_iter().map(|(line, _)| line).collect();
    Paragraph::new(lines)
      .block(clue_list_block())
      .render(areas.clue_list, buf);

    self.status().render(areas.status, buf);
  }
}

/// Maps a key press to a grid event. Keys that are not part of solving map to
/// nothing.
fn key_event(key: KeyEvent) -> Option<Event> {
  if key
    .modifiers
    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
  {
    return None;
  }
  let event = match key.code {
    KeyCode::Char(' ') => Event::Toggle,
    KeyCode::Char(c) => Event::Letter(c),
    KeyCode::Up => Event::Arrow(Arrow::Up),
    KeyCode::Down => Event::Arrow(Arrow::Down),
    KeyCode::Left => Event::Arrow(Arrow::Left),
    KeyCode::Right => Event::Arrow(Arrow::Right),
    KeyCode::Tab => Event::NextClue,
    KeyCode::BackTab => Event::PrevClue,
    KeyCode::Backspace => Event::Backspace,
    KeyCode::Delete => Event::Delete,
    _ => return None,
  };
  Some(event)
}

/// The screen space a `size` by `size` grid asks for.
fn grid_extent(size: usize) -> (u16, u16) {
  let size = u16::try_from(size).unwrap_or(u16::MAX);
  (
    size.saturating_mul(SQUARE_WIDTH + SQUARE_GAP),
    size.saturating_mul(SQUARE_HEIGHT),
  )
}

/// Where the square at `pos` is drawn, clipped to `grid`.
fn square_rect(grid: Rect, (row, col): Pos) -> Rect {
  let offset = |n: usize, stride: u16| u16::try_from(n).unwrap_or(u16::MAX).saturating_mul(stride);
  Rect {
    x: grid.x.saturating_add(offset(col, SQUARE_WIDTH + SQUARE_GAP)),
    y: grid.y.saturating_add(offset(row, SQUARE_HEIGHT)),
    width: SQUARE_WIDTH,
    height: SQUARE_HEIGHT,
  }
  .intersection(grid)
}

/// The square under a screen position, if the position is on one.
fn square_at(grid: Rect, (column, row): (u16, u16)) -> Option<Pos> {
  if column < grid.x || row < grid.y || column >= grid.right() || row >= grid.bottom() {
    return None;
  }
  let dx = column - grid.x;
  let stride = SQUARE_WIDTH + SQUARE_GAP;
  if dx % stride >= SQUARE_WIDTH {
    return None;
  }
  Some((
    ((row - grid.y) / SQUARE_HEIGHT) as usize,
    (dx / stride) as usize,
  ))
}

fn direction_letter(direction: Direction) -> char {
  match direction {
    Across => 'A',
    Down => 'D',
  }
}

/// https://ratatui.rs/recipes/layout/center-a-widget/
fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
  let [area] = Layout::horizontal([horizontal])
    .flex(Flex::Center)
    .areas(area);
  let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
  area
}
