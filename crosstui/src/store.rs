use chrono::{DateTime, Utc};
use crossword::progress::{ProgressKey, ProgressSnapshot, ProgressStore, StoreError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps each snapshot as `<directory>/<user>/<puzzle>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
  directory: PathBuf,
}

impl FileStore {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
    }
  }

  fn path(&self, key: &ProgressKey) -> PathBuf {
    self
      .directory
      .join(file_name(&key.user))
      .join(format!("{}.json", file_name(&key.puzzle)))
  }
}

/// Keeps names to one path component.
fn file_name(name: &str) -> String {
  let cleaned: String = name
    .chars()
    .map(|c| match c {
      'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
      _ => '_',
    })
    .collect();
  if cleaned.is_empty() {
    "_".to_owned()
  } else {
    cleaned
  }
}

fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let tmp = path.with_extension("json.tmp");
  fs::write(&tmp, contents)?;
  fs::rename(&tmp, path)
}

impl ProgressStore for FileStore {
  fn load(&self, key: &ProgressKey) -> Result<Option<ProgressSnapshot>, StoreError> {
    let path = self.path(key);
    let text = match fs::read_to_string(&path) {
      Ok(text) => text,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    debug!(path = %path.display(), "read progress");
    Ok(Some(ProgressSnapshot::from_json(&text)?))
  }

  fn save(&self, key: &ProgressKey, snapshot: &ProgressSnapshot) -> Result<DateTime<Utc>, StoreError> {
    let now = Utc::now();
    let stored = ProgressSnapshot {
      last_played_at: Some(now),
      ..snapshot.clone()
    };
    let path = self.path(key);
    write_atomic(&path, &stored.to_json()?)?;
    debug!(path = %path.display(), "wrote progress");
    Ok(now)
  }
}
