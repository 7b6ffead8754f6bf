//! Durable key-value slot abstraction
//!
//! The store persists one serialized snapshot under a fixed key. Hosts
//! provide the backing medium; the CLI uses a JSON file per key.

use std::collections::HashMap;

use crate::error::Result;

/// Key the task snapshot is stored under
pub const TASKS_KEY: &str = "tasks";

/// A durable key-value slot holding textual values
pub trait SnapshotSlot {
    /// Read the value under `key`; `None` if never written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key` as a whole
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: SnapshotSlot + ?Sized> SnapshotSlot for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

/// Slot kept in memory for the lifetime of the process
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed a value
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl SnapshotSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
