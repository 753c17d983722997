//! File-backed identity store.
//!
//! Slots are kept as a flat JSON object (`{"chat-username": "SwiftFox"}`).
//! A missing file is an empty store.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use hiroba_server::domain::{IdentityStore, IdentityStoreError};

#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    // serializes read-modify-write in `set`
    write_lock: Mutex<()>,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> Result<BTreeMap<String, String>, IdentityStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(unavailable(&self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| unavailable(&self.path, e))
    }

    fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<(), IdentityStoreError> {
        let json = serde_json::to_string_pretty(slots).map_err(|e| unavailable(&self.path, e))?;

        // write to a sibling file first so a crash never leaves a truncated store
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|e| unavailable(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| unavailable(&self.path, e))
    }
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> IdentityStoreError {
    IdentityStoreError::Unavailable(format!("{}: {}", path.display(), e))
}

impl IdentityStore for FileIdentityStore {
    fn get(&self, key: &str) -> Result<Option<String>, IdentityStoreError> {
        Ok(self.read_slots()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), IdentityStoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| IdentityStoreError::Unavailable(e.to_string()))?;

        let mut slots = match self.read_slots() {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!("Overwriting unreadable identity file: {}", e);
                BTreeMap::new()
            }
        };
        slots.insert(key.to_string(), value.to_string());
        self.write_slots(&slots)
    }
}
