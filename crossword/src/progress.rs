//! The boundary with whatever stores solving progress. The engine reads one
//! snapshot when a puzzle is opened and hands out snapshots to save; storage
//! itself lives behind [ProgressStore].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long edits are coalesced before a save is released.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_millis(1000);

/// Identifies one user's progress on one puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
  pub user: String,
  pub puzzle: String,
}

impl ProgressKey {
  pub fn new(user: impl Into<String>, puzzle: impl Into<String>) -> Self {
    Self {
      user: user.into(),
      puzzle: puzzle.into(),
    }
  }
}

/// A user's grid for one puzzle, in the shape the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
  /// Rows of one-letter strings, `""` for unfilled cells.
  pub grid: Vec<Vec<String>>,
  pub completed: bool,
  /// Set by the store when the snapshot is saved.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_played_at: Option<DateTime<Utc>>,
}

impl ProgressSnapshot {
  /// Accepts either a snapshot object or a JSON string holding one, since stores
  /// have been seen to keep it both ways.
  pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
    match serde_json::from_str::<serde_json::Value>(text)? {
      serde_json::Value::String(inner) => serde_json::from_str(&inner),
      value => serde_json::from_value(value),
    }
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }
}

/// A snapshot that cannot be applied to the open puzzle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
  #[error("snapshot is {rows}x{cols} but the puzzle is {expected}x{expected}")]
  Dimensions {
    expected: usize,
    rows: usize,
    cols: usize,
  },
}

/// Failures reported by a [ProgressStore].
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("progress store I/O failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("stored progress is malformed: {0}")]
  Format(#[from] serde_json::Error),
  #[error("progress store rejected the request: {0}")]
  Rejected(String),
}

/// Durable per-user, per-puzzle progress.
pub trait ProgressStore {
  /// The stored snapshot for `key`, or `None` if nothing has been saved yet.
  fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, StoreError>;

  /// Upserts the snapshot for `key`, returning the last-modified time the store
  /// recorded for it.
  fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<DateTime<Utc>, StoreError>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for &S {
  fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, StoreError> {
    (**self).load(key)
  }

  fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<DateTime<Utc>, StoreError> {
    (**self).save(key, snapshot)
  }
}

/// Coalesces a burst of edits into one save. Only the newest snapshot is kept;
/// it is released once it has waited `interval`, so saves go out at most once
/// per interval.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
  interval: Duration,
  pending: Option<(ProgressSnapshot, Instant)>,
}

impl SaveDebouncer {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval,
      pending: None,
    }
  }

  /// Records the latest snapshot. The wait starts from the first unsaved edit.
  pub fn mark(&mut self, snapshot: ProgressSnapshot, now: Instant) {
    let since = self.pending.take().map_or(now, |(_, since)| since);
    self.pending = Some((snapshot, since));
  }

  /// Releases the pending snapshot if it has waited long enough.
  pub fn poll(&mut self, now: Instant) -> Option<ProgressSnapshot> {
    match &self.pending {
      Some((_, since)) if now.saturating_duration_since(*since) >= self.interval => {
        self.pending.take().map(|(snapshot, _)| snapshot)
      }
      _ => None,
    }
  }

  /// Releases the pending snapshot regardless of timing, e.g. when the puzzle
  /// is closed.
  pub fn flush(&mut self) -> Option<ProgressSnapshot> {
    self.pending.take().map(|(snapshot, _)| snapshot)
  }

  /// Puts back a snapshot whose save failed, to be tried again after another
  /// interval. A newer pending snapshot wins over the failed one.
  pub fn retry(&mut self, snapshot: ProgressSnapshot, now: Instant) {
    if self.pending.is_none() {
      self.pending = Some((snapshot, now));
    }
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// When the pending snapshot becomes due, if there is one.
  pub fn deadline(&self) -> Option<Instant> {
    self.pending.as_ref().map(|(_, since)| *since + self.interval)
  }
}

impl Default for SaveDebouncer {
  fn default() -> Self {
    Self::new(DEFAULT_SAVE_INTERVAL)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn snapshot(letter: &str) -> ProgressSnapshot {
    ProgressSnapshot {
      grid: vec![vec![letter.to_string(), String::new()]; 2],
      completed: false,
      last_played_at: None,
    }
  }

  #[test]
  fn snapshot_json_shape() {
    let mut snap = snapshot("A");
    let json = snap.to_json().unwrap();
    assert_eq!(json, r#"{"grid":[["A",""],["A",""]],"completed":false}"#);

    snap.last_played_at = Some(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
    let json = snap.to_json().unwrap();
    assert!(json.contains(r#""lastPlayedAt":"2023-11-14T22:13:20Z""#));
    assert_eq!(ProgressSnapshot::from_json(&json).unwrap(), snap);
  }

  #[test]
  fn snapshot_accepts_string_encoding() {
    let inner = snapshot("B").to_json().unwrap();
    let outer = serde_json::to_string(&inner).unwrap();
    assert_eq!(ProgressSnapshot::from_json(&outer).unwrap(), snapshot("B"));
  }

  #[test]
  fn snapshot_rejects_wrong_shape() {
    assert!(ProgressSnapshot::from_json(r#"{"grid": "AB", "completed": false}"#).is_err());
    assert!(ProgressSnapshot::from_json(r#"{"grid": [["A"]]}"#).is_err());
  }

  #[test]
  fn debouncer_coalesces_a_burst() {
    let start = Instant::now();
    let mut debouncer = SaveDebouncer::new(Duration::from_millis(1000));

    debouncer.mark(snapshot("A"), start);
    debouncer.mark(snapshot("B"), start + Duration::from_millis(300));
    debouncer.mark(snapshot("C"), start + Duration::from_millis(600));

    assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
    assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(1000)));
    assert_eq!(debouncer.poll(start + Duration::from_millis(1000)), Some(snapshot("C")));
    assert!(!debouncer.is_pending());
    assert_eq!(debouncer.poll(start + Duration::from_millis(5000)), None);
  }

  #[test]
  fn releases_are_at_least_an_interval_apart() {
    let start = Instant::now();
    let interval = Duration::from_millis(1000);
    let mut debouncer = SaveDebouncer::new(interval);
    let mut released = vec![];

    // An edit every 100ms for five seconds.
    for step in 0..50 {
      let now = start + Duration::from_millis(step * 100);
      debouncer.mark(snapshot("A"), now);
      if debouncer.poll(now).is_some() {
        released.push(now);
      }
    }

    assert!(released.len() >= 4);
    for pair in released.windows(2) {
      assert!(pair[1] - pair[0] >= interval);
    }
  }

  #[test]
  fn flush_ignores_timing() {
    let mut debouncer = SaveDebouncer::default();
    assert_eq!(debouncer.flush(), None);
    debouncer.mark(snapshot("A"), Instant::now());
    assert_eq!(debouncer.flush(), Some(snapshot("A")));
    assert_eq!(debouncer.flush(), None);
  }

  #[test]
  fn retry_keeps_newer_edits() {
    let start = Instant::now();
    let mut debouncer = SaveDebouncer::new(Duration::from_millis(1000));

    debouncer.retry(snapshot("A"), start);
    assert_eq!(debouncer.poll(start + Duration::from_millis(999)), None);
    assert_eq!(debouncer.poll(start + Duration::from_millis(1000)), Some(snapshot("A")));

    debouncer.mark(snapshot("B"), start);
    debouncer.retry(snapshot("A"), start);
    assert_eq!(debouncer.flush(), Some(snapshot("B")));
  }
}
