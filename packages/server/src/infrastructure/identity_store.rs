//! InMemory identity store.

use std::{collections::HashMap, sync::Mutex};

use crate::domain::{IdentityStore, IdentityStoreError};

/// Process-local key-value slots, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    slots: Mutex<HashMap<String, String>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn get(&self, key: &str) -> Result<Option<String>, IdentityStoreError> {
        let slots = self
            .slots
            .lock()
            .map_err(|e| IdentityStoreError::Unavailable(e.to_string()))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), IdentityStoreError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| IdentityStoreError::Unavailable(e.to_string()))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
