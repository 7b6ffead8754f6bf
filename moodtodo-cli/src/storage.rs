//! JSON file storage adapter for the task store
//!
//! Each slot key maps to `<dir>/<key>.json`. Saves go through a temporary
//! file and a rename so the snapshot is replaced atomically, and the
//! previous snapshot is kept as `<key>.json.bak`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use moodtodo_core::{CoreError, SnapshotSlot, Task, snapshot};

use crate::error::{CliError, Result};

/// JSON file slot
pub struct JsonFileSlot {
    dir: PathBuf,
    backup: bool,
}

impl JsonFileSlot {
    /// Create a new slot rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            backup: true,
        }
    }

    /// Builder method to enable or disable backups
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Get the storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value of `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn backup_path(&self, key: &str) -> PathBuf {
        self.path_for(key).with_extension("json.bak")
    }

    /// Create a backup of the value file
    pub fn backup(&self, key: &str) -> std::io::Result<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(()); // Nothing to backup
        }
        fs::copy(&path, self.backup_path(key))?;
        Ok(())
    }

    /// Check if backup exists
    pub fn backup_exists(&self, key: &str) -> bool {
        self.backup_path(key).exists()
    }

    /// Read tasks from the backup file
    pub fn recover(&self, key: &str) -> Result<Vec<Task>> {
        let backup_path = self.backup_path(key);

        if !backup_path.exists() {
            return Err(CliError::storage("Backup file not found"));
        }

        let raw = fs::read_to_string(&backup_path)
            .map_err(|e| CliError::io(format!("Failed to read {}", backup_path.display()), e))?;
        Ok(snapshot::decode(&raw)?)
    }

    fn write_atomic(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        if self.backup {
            self.backup(key)?;
        }

        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "Wrote snapshot");
        Ok(())
    }
}

impl SnapshotSlot for JsonFileSlot {
    fn read(&self, key: &str) -> moodtodo_core::Result<Option<String>> {
        let path = self.path_for(key);

        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|e| {
            CoreError::storage_with_source(format!("Failed to read {}", path.display()), e)
        })?;

        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(raw))
    }

    fn write(&mut self, key: &str, value: &str) -> moodtodo_core::Result<()> {
        self.write_atomic(key, value).map_err(|e| {
            CoreError::storage_with_source(
                format!("Failed to write {}", self.path_for(key).display()),
                e,
            )
        })
    }
}
