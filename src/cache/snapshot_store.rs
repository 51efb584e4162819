use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::MapError;

/// String-keyed durable slots holding opaque text.
pub trait SnapshotStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, MapError>;
    /// Replace the slot's contents entirely.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MapError>;
}

/// Keeps each slot in `<dir>/<key>.json`.
#[derive(Debug)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: &Path) -> Result<Self, MapError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, MapError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MapError> {
        // Write next to the slot and rename over it so a crash never leaves half a snapshot.
        let slot_path = self.slot_path(key);
        let staging_path = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&staging_path, value)?;
        fs::rename(&staging_path, &slot_path)?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    slots: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl SnapshotStore for InMemorySnapshotStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, MapError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MapError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
