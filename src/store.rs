//! JSON-file snapshot store.
//!
//! The whole list lives in one file as a JSON array, most recent first. A
//! missing file is an empty store. Writes go to a sibling temp file that is
//! renamed over the original, so a crash mid-write leaves the old list intact.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use canvas::error::{CanvasError, Result};
use canvas::snapshot::{SavedDocumentSnapshot, SnapshotStore};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The store location and an index/name/savedAt row per entry.
    ///
    /// # Errors
    ///
    /// As [`SnapshotStore::list`].
    pub fn listing(&self) -> Result<Value> {
        let entries: Vec<Value> = self
            .list()?
            .into_iter()
            .enumerate()
            .map(|(index, snap)| json!({ "index": index, "name": snap.name, "savedAt": snap.saved_at }))
            .collect();
        Ok(json!({ "store": self.path.display().to_string(), "entries": entries }))
    }

    fn read_all(&self) -> Result<Vec<SavedDocumentSnapshot>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(store_error(&self.path, &err)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| store_error(&self.path, &e))
    }

    fn write_all(&self, entries: &[SavedDocumentSnapshot]) -> Result<()> {
        let rendered = serde_json::to_string_pretty(entries).map_err(|e| store_error(&self.path, &e))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| store_error(parent, &e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, rendered).map_err(|e| store_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| store_error(&self.path, &e))?;
        tracing::debug!(path = %self.path.display(), entries = entries.len(), "store written");
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn append(&mut self, snapshot: SavedDocumentSnapshot) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(0, snapshot);
        self.write_all(&entries)
    }

    fn list(&self) -> Result<Vec<SavedDocumentSnapshot>> {
        self.read_all()
    }

    fn delete(&mut self, index: usize) -> Result<Option<SavedDocumentSnapshot>> {
        let mut entries = self.read_all()?;
        if index >= entries.len() {
            return Ok(None);
        }
        let removed = entries.remove(index);
        self.write_all(&entries)?;
        Ok(Some(removed))
    }
}

fn store_error(path: &Path, err: &dyn std::fmt::Display) -> CanvasError {
    CanvasError::Store(format!("{}: {err}", path.display()))
}
