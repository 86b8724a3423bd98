//! Synchronous key-value slots for local persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CalPlanError, CalPlanResult};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> CalPlanResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> CalPlanResult<()>;
}

/// One file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for_key(&self, key: &str) -> PathBuf {
        let safe_key = key.replace(['/', '\\', ':'], "_");
        self.dir.join(format!("{safe_key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CalPlanResult<Option<String>> {
        let path = self.path_for_key(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "slot not found");
                Ok(None)
            }
            Err(e) => Err(CalPlanError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> CalPlanResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CalPlanError::Storage(format!(
                "Failed to create directory {}: {e}",
                self.dir.display()
            ))
        })?;

        // Sibling file, then rename over the slot
        let path = self.path_for_key(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| {
                CalPlanError::Storage(format!("Failed to write {}: {e}", path.display()))
            })?;

        debug!(path = %path.display(), bytes = value.len(), "slot written");
        Ok(())
    }
}

/// In-memory slots, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CalPlanResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> CalPlanResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
