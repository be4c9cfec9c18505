//! Plan persistence with file locking.
//!
//! The plan and its start date live in two JSON files inside the data
//! directory. Saves are atomic (temp file, fsync, rename) and serialized
//! with an exclusive lock; loads take a shared lock and treat a missing or
//! corrupted file as empty.

use crate::{Error, Result, Session};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the persisted session list
pub const SESSIONS_FILE: &str = "sessions.json";

/// File name of the persisted start date
pub const START_DATE_FILE: &str = "start_date.json";

/// Where the scheduler keeps its plan between runs
pub trait PlanStore {
    /// Last saved plan, or empty
    fn load_sessions(&self) -> Result<Vec<Session>>;

    /// Replace the stored plan with `sessions`
    fn save_sessions(&mut self, sessions: &[Session]) -> Result<()>;

    fn load_start_date(&self) -> Result<Option<NaiveDate>>;

    fn save_start_date(&mut self, start: NaiveDate) -> Result<()>;

    /// Forget both the plan and the start date
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StartDateFile {
    start_date: NaiveDate,
}

/// JSON files in a data directory
#[derive(Clone, Debug)]
pub struct JsonPlanStore {
    dir: PathBuf,
}

impl JsonPlanStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.dir.join(SESSIONS_FILE)
    }

    pub fn start_date_path(&self) -> PathBuf {
        self.dir.join(START_DATE_FILE)
    }
}

impl PlanStore for JsonPlanStore {
    fn load_sessions(&self) -> Result<Vec<Session>> {
        let sessions: Vec<Session> = read_json(&self.sessions_path())?.unwrap_or_default();
        tracing::debug!("Loaded {} sessions", sessions.len());
        Ok(sessions)
    }

    fn save_sessions(&mut self, sessions: &[Session]) -> Result<()> {
        write_json_atomic(&self.sessions_path(), sessions)?;
        tracing::debug!("Saved {} sessions to {:?}", sessions.len(), self.sessions_path());
        Ok(())
    }

    fn load_start_date(&self) -> Result<Option<NaiveDate>> {
        let file: Option<StartDateFile> = read_json(&self.start_date_path())?;
        Ok(file.map(|f| f.start_date))
    }

    fn save_start_date(&mut self, start: NaiveDate) -> Result<()> {
        write_json_atomic(&self.start_date_path(), &StartDateFile { start_date: start })
    }

    fn clear(&mut self) -> Result<()> {
        for path in [self.sessions_path(), self.start_date_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }
}

/// Read a JSON document under a shared lock
///
/// Returns `None` if the file doesn't exist. If it can't be read or parsed,
/// logs a warning and returns `None` as well.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No file at {:?}", path);
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Treating as empty.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Treating as empty.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Treating as empty.", path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Treating as empty.", path, e);
            Ok(None)
        }
    }
}

/// Atomically replace `path` with the JSON encoding of `value`
///
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;

    // Exclusive lock on the temp file serializes concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonPlanStore::new(temp_dir.path());

        let mut sessions = program::generate(start());
        sessions[0].completed = true;
        sessions[1].date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        store.save_sessions(&sessions).unwrap();
        store.save_start_date(start()).unwrap();

        let loaded = JsonPlanStore::new(temp_dir.path());
        assert_eq!(loaded.load_sessions().unwrap(), sessions);
        assert_eq!(loaded.load_start_date().unwrap(), Some(start()));
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonPlanStore::new(temp_dir.path().join("missing"));

        assert!(store.load_sessions().unwrap().is_empty());
        assert_eq!(store.load_start_date().unwrap(), None);
    }

    #[test]
    fn test_corrupted_sessions_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonPlanStore::new(temp_dir.path());

        std::fs::write(store.sessions_path(), "{ invalid json }").unwrap();

        assert!(store.load_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonPlanStore::new(temp_dir.path());

        store.save_sessions(&program::generate(start())).unwrap();
        store.save_start_date(start()).unwrap();
        store.clear().unwrap();

        assert!(!store.sessions_path().exists());
        assert!(!store.start_date_path().exists());

        // Clearing again is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonPlanStore::new(temp_dir.path());

        store.save_sessions(&program::generate(start())).unwrap();
        store.save_sessions(&[]).unwrap();

        assert!(store.sessions_path().exists());
        assert!(store.load_sessions().unwrap().is_empty());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != SESSIONS_FILE)
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only {}, found extras: {:?}",
            SESSIONS_FILE,
            extras
        );
    }
}
