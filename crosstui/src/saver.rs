//! Background saving, so the UI loop never waits on the disk.

use chrono::{DateTime, Utc};
use crossword::progress::{ProgressKey, ProgressSnapshot, ProgressStore};
use std::io;
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// The result of one save, reported back to the UI loop.
#[derive(Debug)]
pub enum SaveOutcome {
  Saved(DateTime<Utc>),
  /// The snapshot is handed back so it can be retried.
  Failed {
    snapshot: ProgressSnapshot,
    error: String,
  },
}

/// Owns the thread that writes snapshots for one puzzle.
pub struct SaveWorker {
  requests: Option<mpsc::Sender<ProgressSnapshot>>,
  outcomes: mpsc::Receiver<SaveOutcome>,
  thread: Option<JoinHandle<()>>,
}

impl SaveWorker {
  pub fn spawn<S>(store: S, key: ProgressKey) -> io::Result<Self>
  where
    S: ProgressStore + Send + 'static,
  {
    let (requests, request_rx) = mpsc::channel::<ProgressSnapshot>();
    let (outcome_tx, outcomes) = mpsc::channel();

    let thread = std::thread::Builder::new()
      .name("progress-saver".into())
      .spawn(move || {
        // Exits once the sender is dropped and the queue is drained.
        while let Ok(snapshot) = request_rx.recv() {
          let outcome = match store.save(&key, &snapshot) {
            Ok(at) => {
              info!(user = %key.user, puzzle = %key.puzzle, completed = snapshot.completed, "saved progress");
              SaveOutcome::Saved(at)
            }
            Err(e) => {
              warn!(error = %e, user = %key.user, puzzle = %key.puzzle, "save failed");
              SaveOutcome::Failed {
                snapshot,
                error: e.to_string(),
              }
            }
          };
          if outcome_tx.send(outcome).is_err() {
            return;
          }
        }
      })?;

    Ok(Self {
      requests: Some(requests),
      outcomes,
      thread: Some(thread),
    })
  }

  /// Queues a snapshot. Returns it back if the worker has gone away.
  pub fn submit(&self, snapshot: ProgressSnapshot) -> Result<(), ProgressSnapshot> {
    match &self.requests {
      Some(requests) => requests.send(snapshot).map_err(|e| e.0),
      None => Err(snapshot),
    }
  }

  /// Outcomes of saves that finished since the last call.
  pub fn outcomes(&self) -> impl Iterator<Item = SaveOutcome> + '_ {
    self.outcomes.try_iter()
  }

  /// Waits for queued saves to finish and stops the thread. Returns the
  /// outcomes that had not been collected yet.
  pub fn shutdown(mut self) -> Vec<SaveOutcome> {
    self.requests.take();
    if let Some(handle) = self.thread.take() {
      if handle.join().is_err() {
        warn!("progress saver panicked");
      }
    }
    self.outcomes.try_iter().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::FileStore;

  fn snapshot(completed: bool) -> ProgressSnapshot {
    ProgressSnapshot {
      grid: vec![vec!["A".to_owned()]],
      completed,
      last_played_at: None,
    }
  }

  #[test]
  fn shutdown_finishes_queued_saves() {
    let dir = tempfile::tempdir().unwrap();
    let key = ProgressKey::new("ada", "7");
    let worker = SaveWorker::spawn(FileStore::new(dir.path()), key.clone()).unwrap();

    worker.submit(snapshot(false)).unwrap();
    worker.submit(snapshot(true)).unwrap();
    let outcomes = worker.shutdown();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| matches!(o, SaveOutcome::Saved(_))));
    let stored = FileStore::new(dir.path()).load(&key).unwrap().unwrap();
    assert!(stored.completed);
  }

  #[test]
  fn failures_hand_the_snapshot_back() {
    let dir = tempfile::tempdir().unwrap();
    // A file where the user directory should be.
    std::fs::write(dir.path().join("ada"), "").unwrap();
    let worker = SaveWorker::spawn(FileStore::new(dir.path()), ProgressKey::new("ada", "7")).unwrap();

    worker.submit(snapshot(false)).unwrap();
    let outcomes = worker.shutdown();
    assert!(matches!(
      outcomes.as_slice(),
      [SaveOutcome::Failed { snapshot: s, .. }] if *s == snapshot(false)
    ));
  }
}
