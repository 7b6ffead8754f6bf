//! User configuration, loaded with confy
//!
//! Stored in the platform config directory under the `moodtodo` app name.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use moodtodo_core::TASKS_KEY;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the task snapshot
    pub data_directory: String,
    /// Slot key; the snapshot lives in `<data_directory>/<slot_key>.json`
    pub slot_key: String,
    /// Keep a `.bak` copy of the previous snapshot on every save
    pub backup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory().to_string_lossy().into_owned(),
            slot_key: TASKS_KEY.to_string(),
            backup: true,
        }
    }
}

fn default_data_directory() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", "moodtodo") {
        return dirs.data_dir().to_path_buf();
    }
    dirs::home_dir()
        .map(|home| home.join(".moodtodo"))
        .unwrap_or_else(|| PathBuf::from(".moodtodo"))
}

impl Config {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory)
    }
}
