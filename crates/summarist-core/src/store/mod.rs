//! Local key-value storage for session persistence.
//!
//! This module provides:
//! - `KeyValueStore`: string keys to string values, with batched writes
//! - `FileStore`: a JSON object on disk, rewritten atomically per batch
//! - `MemoryStore`: process-local map for tests and throwaway sessions

pub mod file;

pub use file::FileStore;

use std::collections::HashMap;

use anyhow::Result;

/// A persisted string map scoped to one user profile.
///
/// `set_many` and `remove_many` apply all of their changes or none of them,
/// so a reader never sees half of a batch.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove_many(&mut self, keys: &[&str]) -> Result<()>;

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

// Lets a caller keep ownership of the store while a manager borrows it.
impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        (**self).set_many(entries)
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        (**self).remove_many(keys)
    }
}
