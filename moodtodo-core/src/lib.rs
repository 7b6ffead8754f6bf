//! moodtodo Core - Task store and domain logic
//!
//! This crate contains no file or terminal I/O. Persistence goes through
//! the [`SnapshotSlot`] trait, implemented by adapters in consuming crates.

pub mod checklist;
pub mod date;
pub mod error;
pub mod filter;
pub mod slot;
pub mod snapshot;
pub mod store;
pub mod task;

pub use error::{CoreError, Result};
pub use filter::{Bucket, Buckets, FilterExt, StatusFilter, TaskFilter, TaskSort};
pub use slot::{MemorySlot, SnapshotSlot, TASKS_KEY};
pub use store::{SubscriptionId, TaskStore};
pub use task::{ChecklistItem, HistoryEntry, Mood, Task, TaskCollection, TaskId};
