//! JSON session files under the configured data directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use tutor_chat::TutorSession;
use tutor_core::error::{Result, TutorError};
use uuid::Uuid;

/// One `<session-id>.json` file per session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn save(&self, session: &TutorSession) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(session.id);
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, json)?;
        info!(session_id = %session.id, path = %path.display(), "Session saved");
        Ok(path)
    }

    pub fn load(&self, id: Uuid) -> Result<TutorSession> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(TutorError::Session(format!("no saved session {}", id)));
        }
        let content = std::fs::read_to_string(&path)?;
        let session: TutorSession = serde_json::from_str(&content)?;
        debug!(session_id = %id, turns = session.history.len(), "Session loaded");
        Ok(session)
    }

    /// IDs of every saved session, sorted.
    pub fn list(&self) -> Result<Vec<Uuid>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<Uuid> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != "json" {
                    return None;
                }
                path.file_stem()?.to_str()?.parse().ok()
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Read a JSON array of stored records.
pub fn read_records(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(dir: &str) -> PathBuf {
    if let Some(rest) = dir.strip_prefix("~/").or_else(|| dir.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(dir)
    }
}
