use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Repository;

/// Repository that keeps the encoded JSON in memory.
///
/// Clones share the same slot, so a test can hand one clone to a store and
/// inspect or tamper with the raw JSON through another.
pub struct MemoryRepository<T> {
    slot: Arc<Mutex<Option<String>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            _marker: PhantomData,
        }
    }

    /// Start with raw (possibly invalid) JSON in the slot.
    pub fn with_raw(json: impl Into<String>) -> Self {
        let repo = Self::new();
        repo.set_raw(json);
        repo
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    pub fn set_raw(&self, json: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(json.into());
        }
    }
}

impl<T> Clone for MemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Repository<T> for MemoryRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        match self.raw() {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).context("Failed to decode in-memory value")?,
            )),
            None => Ok(None),
        }
    }

    fn save(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("In-memory repository lock poisoned"))?;
        *slot = Some(json);
        Ok(())
    }
}
