//! Task domain model
//!
//! Pure domain logic for task management with no I/O operations.
//! A [`TaskCollection`] is an immutable snapshot; every change produces a
//! new collection and leaves snapshots already handed out untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::filter::Bucket;

/// Newtype wrapper for task IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        TaskId(Uuid::new_v4())
    }

    /// Short form used for display (first 8 hex digits)
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }

    /// Check whether this id starts with the given prefix (hyphens ignored)
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        !prefix.is_empty() && self.0.simple().to_string().starts_with(&prefix)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        TaskId(id)
    }
}

impl FromStr for TaskId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(TaskId)
            .map_err(|e| CoreError::parse_with_source(format!("Invalid task id '{}'", s), e))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mood tag attached to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Stressful,
    Creative,
    Boring,
    Urgent,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Stressful,
        Mood::Creative,
        Mood::Boring,
        Mood::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Stressful => "stressful",
            Mood::Creative => "creative",
            Mood::Boring => "boring",
            Mood::Urgent => "urgent",
        }
    }
}

impl FromStr for Mood {
    type Err = CoreError;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "stressful" => Ok(Mood::Stressful),
            "creative" => Ok(Mood::Creative),
            "boring" => Ok(Mood::Boring),
            "urgent" => Ok(Mood::Urgent),
            other => Err(CoreError::validation(
                "mood",
                format!(
                    "unknown mood '{}' (expected one of: happy, stressful, creative, boring, urgent)",
                    other
                ),
            )),
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a task's checklist
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            checked: false,
        }
    }
}

/// A previous text value of a task and when it was replaced
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub at: DateTime<Utc>,
}

/// A single task
///
/// Serialized field names are camelCase (`doLater`, `finishBefore`, ...) and
/// every timestamp is encoded as epoch milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub do_later: bool,
    #[serde(default, deserialize_with = "mood_or_blank")]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub finish_before: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

// Older snapshots may carry `"mood": ""` for "no mood".
fn mood_or_blank<'de, D>(deserializer: D) -> std::result::Result<Option<Mood>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Mood::from_str(s).map(Some).map_err(serde::de::Error::custom),
    }
}

impl Task {
    /// Create a new task created (and last modified) at `now`
    pub fn new(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            text: text.into(),
            done: false,
            do_later: false,
            mood: None,
            description: String::new(),
            checklist: Vec::new(),
            finish_before: None,
            created_at: now,
            last_modified: now,
            history: Vec::new(),
        }
    }

    /// Builder method to set task ID
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Builder method to set mood
    pub fn with_mood(mut self, mood: Option<Mood>) -> Self {
        self.mood = mood;
        self
    }

    /// Builder method to set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set completion status
    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    /// Builder method to set the deferred flag
    pub fn with_do_later(mut self, do_later: bool) -> Self {
        self.do_later = do_later;
        self
    }

    /// Builder method to set checklist
    pub fn with_checklist(mut self, checklist: Vec<ChecklistItem>) -> Self {
        self.checklist = checklist;
        self
    }

    /// Builder method to set the deadline
    pub fn with_finish_before(mut self, finish_before: Option<DateTime<Utc>>) -> Self {
        self.finish_before = finish_before;
        self
    }

    /// Toggle completion status
    pub fn toggle_done(&mut self, now: DateTime<Utc>) {
        self.done = !self.done;
        self.last_modified = now;
    }

    /// Toggle the "do later" flag
    pub fn toggle_do_later(&mut self, now: DateTime<Utc>) {
        self.do_later = !self.do_later;
        self.last_modified = now;
    }

    /// Apply an edit.
    ///
    /// The current text is pushed to `history` first, even when `text` is
    /// identical. A blank `text` keeps the current text. `mood` and
    /// `description` are only replaced when `Some`; `Some(None)` clears the
    /// mood.
    pub fn apply_edit(
        &mut self,
        text: &str,
        mood: Option<Option<Mood>>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.history.push(HistoryEntry {
            text: self.text.clone(),
            at: now,
        });

        let text = text.trim();
        if !text.is_empty() {
            self.text = text.to_string();
        }
        if let Some(mood) = mood {
            self.mood = mood;
        }
        if let Some(description) = description {
            self.description = description;
        }
        self.last_modified = now;
    }

    /// Replace the whole checklist
    pub fn set_checklist(&mut self, checklist: Vec<ChecklistItem>, now: DateTime<Utc>) {
        self.checklist = checklist;
        self.last_modified = now;
    }

    /// Set or clear the deadline
    pub fn set_finish_before(&mut self, finish_before: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.finish_before = finish_before;
        self.last_modified = now;
    }

    /// Which bucket this task belongs to (done wins over do-later)
    pub fn bucket(&self) -> Bucket {
        Bucket::of(self.done, self.do_later)
    }

    /// Check if the task's deadline has passed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.finish_before {
            Some(deadline) => !self.done && deadline < now,
            None => false,
        }
    }

    /// (checked, total) checklist counts
    pub fn checklist_progress(&self) -> (usize, usize) {
        let checked = self.checklist.iter().filter(|item| item.checked).count();
        (checked, self.checklist.len())
    }
}

/// Immutable, ordered snapshot of tasks
///
/// Cloning is cheap (shared buffer). Order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCollection {
    tasks: Arc<[Task]>,
}

impl TaskCollection {
    /// Create a new empty task collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, keeping the first task of any duplicated id
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut seen = HashSet::with_capacity(tasks.len());
        let mut unique = Vec::with_capacity(tasks.len());
        for task in tasks {
            if seen.insert(task.id) {
                unique.push(task);
            } else {
                warn!(id = %task.id, "Dropping task with duplicate id");
            }
        }
        Self {
            tasks: unique.into(),
        }
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Count total tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if collection is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Get or return error if task not found
    pub fn get_or_err(&self, id: &TaskId) -> Result<&Task> {
        self.get(id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    /// Look up a task by a full id or a unique id prefix
    pub fn resolve(&self, prefix: &str) -> Result<&Task> {
        if let Ok(id) = prefix.parse::<TaskId>() {
            return self.get_or_err(&id);
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.matches_prefix(prefix));
        match (matches.next(), matches.count()) {
            (Some(task), 0) => Ok(task),
            (Some(_), rest) => Err(CoreError::AmbiguousId {
                prefix: prefix.to_string(),
                count: rest + 1,
            }),
            (None, _) => Err(CoreError::TaskNotFound(prefix.to_string())),
        }
    }

    /// Count completed tasks
    pub fn count_done(&self) -> usize {
        self.tasks.iter().filter(|t| t.done).count()
    }

    /// Count overdue tasks
    pub fn count_overdue(&self, now: DateTime<Utc>) -> usize {
        self.tasks.iter().filter(|t| t.is_overdue(now)).count()
    }

    /// New collection with `task` appended
    pub(crate) fn appended(&self, task: Task) -> Self {
        let mut tasks = self.tasks.to_vec();
        tasks.push(task);
        Self {
            tasks: tasks.into(),
        }
    }

    /// New collection where the task `id` was changed by `update`, or `None`
    /// when no such task exists
    pub(crate) fn updated(&self, id: &TaskId, update: impl FnOnce(&mut Task)) -> Option<Self> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        let mut tasks = self.tasks.to_vec();
        update(&mut tasks[index]);
        Some(Self {
            tasks: tasks.into(),
        })
    }

    /// New collection without the task `id`, or `None` when absent
    pub(crate) fn without(&self, id: &TaskId) -> Option<Self> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        let mut tasks = self.tasks.to_vec();
        tasks.remove(index);
        Some(Self {
            tasks: tasks.into(),
        })
    }

    /// New collection keeping only tasks matching `keep`, plus how many were removed
    pub(crate) fn retained(&self, keep: impl Fn(&Task) -> bool) -> (Self, usize) {
        let tasks: Vec<Task> = self.tasks.iter().filter(|t| keep(*t)).cloned().collect();
        let removed = self.tasks.len() - tasks.len();
        (
            Self {
                tasks: tasks.into(),
            },
            removed,
        )
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_task_creation() {
        let task = Task::new("Test task", at(1_000));

        assert_eq!(task.text, "Test task");
        assert!(!task.done);
        assert!(!task.do_later);
        assert!(task.mood.is_none());
        assert_eq!(task.description, "");
        assert!(task.checklist.is_empty());
        assert!(task.history.is_empty());
        assert_eq!(task.created_at, task.last_modified);
    }

    #[test]
    fn test_task_toggle() {
        let mut task = Task::new("Test", at(1_000));

        task.toggle_done(at(2_000));
        assert!(task.done);
        assert_eq!(task.last_modified, at(2_000));
        assert_eq!(task.created_at, at(1_000));

        task.toggle_done(at(3_000));
        assert!(!task.done);
    }

    #[test]
    fn test_edit_records_previous_text() {
        let mut task = Task::new("Old", at(1_000)).with_mood(Some(Mood::Boring));

        task.apply_edit("New", None, None, at(2_000));

        assert_eq!(task.text, "New");
        assert_eq!(task.mood, Some(Mood::Boring));
        assert_eq!(
            task.history,
            vec![HistoryEntry {
                text: "Old".to_string(),
                at: at(2_000)
            }]
        );
    }

    #[test]
    fn test_edit_same_text_still_recorded() {
        let mut task = Task::new("Same", at(1_000));
        task.apply_edit("Same", None, Some("notes".to_string()), at(2_000));

        assert_eq!(task.history.len(), 1);
        assert_eq!(task.description, "notes");
    }

    #[test]
    fn test_edit_clear_mood_and_blank_description() {
        let mut task = Task::new("Task", at(1_000))
            .with_mood(Some(Mood::Happy))
            .with_description("details");

        task.apply_edit("Task", Some(None), Some(String::new()), at(2_000));

        assert!(task.mood.is_none());
        assert_eq!(task.description, "");
    }

    #[test]
    fn test_bucket_done_wins() {
        let task = Task::new("Both", at(0)).with_done(true).with_do_later(true);
        assert_eq!(task.bucket(), Bucket::Done);
    }

    #[test]
    fn test_is_overdue() {
        let task = Task::new("Deadline", at(0)).with_finish_before(Some(at(5_000)));

        assert!(task.is_overdue(at(6_000)));
        assert!(!task.is_overdue(at(4_000)));
        assert!(!task.clone().with_done(true).is_overdue(at(6_000)));
    }

    #[test]
    fn test_mood_parse() {
        assert_eq!("Urgent".parse::<Mood>().unwrap(), Mood::Urgent);
        assert!("sleepy".parse::<Mood>().is_err());
    }

    #[test]
    fn test_collection_dedupes_ids() {
        let first = Task::new("First", at(0));
        let dup = Task::new("Dup", at(0)).with_id(first.id);

        let collection = TaskCollection::from_tasks(vec![first.clone(), dup]);

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(&first.id).unwrap().text, "First");
    }

    #[test]
    fn test_updated_leaves_original_snapshot() {
        let task = Task::new("Task", at(0));
        let id = task.id;
        let before = TaskCollection::from_tasks(vec![task]);

        let after = before.updated(&id, |t| t.toggle_done(at(1))).unwrap();

        assert!(!before.get(&id).unwrap().done);
        assert!(after.get(&id).unwrap().done);
    }

    #[test]
    fn test_updated_missing_id() {
        let collection = TaskCollection::from_tasks(vec![Task::new("Task", at(0))]);
        assert!(collection.updated(&TaskId::new(), |_| {}).is_none());
        assert!(collection.without(&TaskId::new()).is_none());
    }

    #[test]
    fn test_resolve_prefix() {
        let a = Task::new("A", at(0))
            .with_id("aaaaaaaa-0000-4000-8000-000000000001".parse().unwrap());
        let b = Task::new("B", at(0))
            .with_id("aaaabbbb-0000-4000-8000-000000000002".parse().unwrap());
        let collection = TaskCollection::from_tasks(vec![a.clone(), b.clone()]);

        assert_eq!(collection.resolve("aaaab").unwrap().id, b.id);
        assert_eq!(collection.resolve(&a.id.to_string()).unwrap().id, a.id);
        assert!(matches!(
            collection.resolve("aaaa"),
            Err(CoreError::AmbiguousId { count: 2, .. })
        ));
        assert!(matches!(
            collection.resolve("ffff"),
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_retained_counts_removed() {
        let collection = TaskCollection::from_tasks(vec![
            Task::new("1", at(0)).with_done(true),
            Task::new("2", at(0)),
            Task::new("3", at(0)).with_done(true),
        ]);

        let (kept, removed) = collection.retained(|t| !t.done);

        assert_eq!(removed, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.as_slice()[0].text, "2");
    }
}
