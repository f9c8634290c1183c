//! Session credential storage.
//!
//! The browser client keeps its session token in localStorage and replays it
//! as an `authenticate` event after every reconnect. The native equivalent
//! is a small JSON file at `~/.autogent/.session.json`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RealtimeError;

const SESSION_DIR: &str = ".autogent";
const SESSION_FILE: &str = ".session.json";

/// Identity replayed to the backend after each (re)connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub user_id: String,
    pub session_token: String,
}

/// Manages session credential storage under the user's home directory.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at `~/.autogent/.session.json`.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self {
            path: home.join(SESSION_DIR).join(SESSION_FILE),
        })
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load credentials, or `None` if the file is missing or unreadable.
    pub fn load(&self) -> Option<SessionCredentials> {
        let file = File::open(&self.path).ok()?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(creds) => Some(creds),
            Err(e) => {
                debug!(error = %e, path = %self.path.display(), "session file unreadable");
                None
            }
        }
    }

    /// Persist credentials, creating the parent directory if needed.
    pub fn save(&self, creds: &SessionCredentials) -> Result<(), RealtimeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, creds)?;
        writer.flush()?;
        Ok(())
    }

    /// Remove any stored credentials. Missing file is not an error.
    pub fn clear(&self) -> Result<(), RealtimeError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::at(dir.path().join(".autogent").join(".session.json"))
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let creds = SessionCredentials {
            user_id: "user-42".to_string(),
            session_token: "tok-abc".to_string(),
        };
        store.save(&creds).unwrap();

        assert_eq!(store.load(), Some(creds));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        // Clearing a missing file is fine
        store.clear().unwrap();

        let creds = SessionCredentials {
            user_id: "u".to_string(),
            session_token: "t".to_string(),
        };
        store.save(&creds).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
