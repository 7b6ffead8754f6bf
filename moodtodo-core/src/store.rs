//! Task store service
//!
//! Owns the canonical task collection, defines every permitted mutation and
//! keeps the durable slot in sync.
//!
//! Lifecycle:
//! 1. [`TaskStore::new`] builds an unloaded store; writes are suppressed.
//! 2. [`TaskStore::load`] reads the slot exactly once. Missing, unreadable or
//!    corrupt data loads as an empty collection.
//! 3. Every mutation that changes the collection replaces it with a new
//!    snapshot, notifies subscribers and rewrites the whole slot.
//!
//! Mutations naming an unknown id do nothing and report `false`. A failed
//! write is logged and kept in [`TaskStore::take_persist_error`]; the
//! in-memory collection stays authoritative.

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, warn};

use crate::checklist;
use crate::date;
use crate::error::{CoreError, Result};
use crate::slot::{SnapshotSlot, TASKS_KEY};
use crate::snapshot;
use crate::task::{ChecklistItem, Mood, Task, TaskCollection, TaskId};

/// Source of "now" for bookkeeping timestamps
pub type Clock = fn() -> DateTime<Utc>;

/// Callback receiving every new snapshot
pub type Listener = Box<dyn FnMut(&TaskCollection)>;

/// Handle returned by [`TaskStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct TaskStore<S: SnapshotSlot> {
    slot: S,
    key: String,
    tasks: TaskCollection,
    loaded: bool,
    clock: Clock,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    persist_error: Option<CoreError>,
}

impl<S: SnapshotSlot> TaskStore<S> {
    /// Create an unloaded store over `slot`
    pub fn new(slot: S) -> Self {
        Self {
            slot,
            key: TASKS_KEY.to_string(),
            tasks: TaskCollection::new(),
            loaded: false,
            clock: date::now,
            listeners: Vec::new(),
            next_subscription: 0,
            persist_error: None,
        }
    }

    /// Create a store and load it from `slot`
    pub fn open(slot: S) -> Self {
        let mut store = Self::new(slot);
        store.load();
        store
    }

    /// Builder method to use a different slot key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Builder method to set the clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Read the persisted snapshot. Runs once; later calls return `false`.
    pub fn load(&mut self) -> bool {
        if self.loaded {
            return false;
        }

        let tasks = match self.slot.read(&self.key) {
            Ok(Some(raw)) => snapshot::decode(&raw).unwrap_or_else(|e| {
                warn!(key = %self.key, error = %e, "Stored tasks are unreadable, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not read stored tasks, starting empty");
                Vec::new()
            }
        };

        self.tasks = TaskCollection::from_tasks(tasks);
        self.loaded = true;
        debug!(count = self.tasks.len(), "Loaded tasks");
        self.notify();
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Current snapshot (cheap clone, never changes afterwards)
    pub fn snapshot(&self) -> TaskCollection {
        self.tasks.clone()
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Look up a task by full id or unique id prefix
    pub fn resolve(&self, prefix: &str) -> Result<&Task> {
        self.tasks.resolve(prefix)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Register a listener called with every new snapshot
    pub fn subscribe(&mut self, listener: impl FnMut(&TaskCollection) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// The last failed write, if any, clearing it
    pub fn take_persist_error(&mut self) -> Option<CoreError> {
        self.persist_error.take()
    }

    /// Add a task. Text is trimmed and must not be blank.
    pub fn add(
        &mut self,
        text: &str,
        mood: Option<Mood>,
        description: Option<String>,
    ) -> Result<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::validation("text", "task text must not be empty"));
        }

        let task = Task::new(text, self.now())
            .with_mood(mood)
            .with_description(description.unwrap_or_default());
        let id = task.id;

        let next = self.tasks.appended(task);
        self.commit(next);
        Ok(id)
    }

    /// Flip `done`
    pub fn toggle_done(&mut self, id: &TaskId) -> bool {
        let now = self.now();
        self.update(id, |task| task.toggle_done(now))
    }

    /// Flip `doLater`
    pub fn toggle_do_later(&mut self, id: &TaskId) -> bool {
        let now = self.now();
        self.update(id, |task| task.toggle_do_later(now))
    }

    /// Remove a task for good
    pub fn delete(&mut self, id: &TaskId) -> bool {
        match self.tasks.without(id) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    /// Edit text, mood and description.
    ///
    /// `mood`: `None` keeps the current mood, `Some(None)` clears it.
    /// `description`: `None` keeps it, `Some(..)` replaces it (empty included).
    /// The previous text is always appended to history.
    pub fn edit(
        &mut self,
        id: &TaskId,
        text: &str,
        mood: Option<Option<Mood>>,
        description: Option<String>,
    ) -> bool {
        let now = self.now();
        self.update(id, |task| task.apply_edit(text, mood, description, now))
    }

    /// Replace the whole checklist
    pub fn update_checklist(&mut self, id: &TaskId, checklist: Vec<ChecklistItem>) -> bool {
        let now = self.now();
        self.update(id, |task| task.set_checklist(checklist, now))
    }

    /// Set (or clear with `None`) the deadline
    pub fn update_finish_before(&mut self, id: &TaskId, finish_before: Option<DateTime<Utc>>) -> bool {
        let now = self.now();
        let finish_before = finish_before.map(|dt| dt.trunc_subsecs(3));
        self.update(id, |task| task.set_finish_before(finish_before, now))
    }

    /// Append a checklist item; `Ok(false)` when the task does not exist
    pub fn add_checklist_item(&mut self, id: &TaskId, text: &str) -> Result<bool> {
        self.edit_checklist(id, |items| checklist::append_item(items, text))
    }

    /// Toggle checklist item `index`; `Ok(false)` when the task does not exist
    pub fn toggle_checklist_item(&mut self, id: &TaskId, index: usize) -> Result<bool> {
        self.edit_checklist(id, |items| checklist::toggle_item(items, index))
    }

    /// Remove checklist item `index`; `Ok(false)` when the task does not exist
    pub fn remove_checklist_item(&mut self, id: &TaskId, index: usize) -> Result<bool> {
        self.edit_checklist(id, |items| checklist::remove_item(items, index))
    }

    /// Remove every done task, returns how many were removed
    pub fn clear_done(&mut self) -> usize {
        let (next, removed) = self.tasks.retained(|task| !task.done);
        if removed > 0 {
            self.commit(next);
        }
        removed
    }

    /// Replace the whole collection (e.g. from a backup)
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.commit(TaskCollection::from_tasks(tasks));
    }

    fn edit_checklist(
        &mut self,
        id: &TaskId,
        transform: impl FnOnce(&[ChecklistItem]) -> Result<Vec<ChecklistItem>>,
    ) -> Result<bool> {
        let Some(task) = self.tasks.get(id) else {
            return Ok(false);
        };
        let checklist = transform(&task.checklist)?;
        Ok(self.update_checklist(id, checklist))
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)().trunc_subsecs(3)
    }

    fn update(&mut self, id: &TaskId, change: impl FnOnce(&mut Task)) -> bool {
        match self.tasks.updated(id, change) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => {
                debug!(%id, "Ignoring mutation of unknown task");
                false
            }
        }
    }

    fn commit(&mut self, next: TaskCollection) {
        self.tasks = next;
        self.notify();
        self.persist();
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.tasks);
        }
    }

    fn persist(&mut self) {
        if !self.loaded {
            debug!("Store not loaded yet, skipping write");
            return;
        }

        let result = snapshot::encode(self.tasks.as_slice())
            .and_then(|raw| self.slot.write(&self.key, &raw));

        match result {
            Ok(()) => {
                debug!(count = self.tasks.len(), "Saved tasks");
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to save tasks, keeping them in memory");
                self.persist_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlot;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_750_000_000_000).unwrap()
    }

    fn store() -> TaskStore<MemorySlot> {
        TaskStore::open(MemorySlot::new()).with_clock(fixed_now)
    }

    struct FailingSlot;

    impl SnapshotSlot for FailingSlot {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(CoreError::storage("disk on fire"))
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(CoreError::storage("disk on fire"))
        }
    }

    #[test]
    fn test_add_defaults() {
        let mut store = store();
        let id = store.add("  Buy milk ", Some(Mood::Urgent), None).unwrap();

        let task = store.get(&id).unwrap();
        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.mood, Some(Mood::Urgent));
        assert_eq!(task.description, "");
        assert_eq!(task.created_at, fixed_now());
        assert_eq!(task.last_modified, fixed_now());
    }

    #[test]
    fn test_add_blank_rejected() {
        let mut store = store();
        assert!(store.add("   ", None, None).is_err());
        assert!(store.is_empty());
        assert!(store.slot().get(TASKS_KEY).is_none());
    }

    #[test]
    fn test_add_persists() {
        let mut store = store();
        store.add("Persist me", None, None).unwrap();

        let raw = store.slot().get(TASKS_KEY).unwrap();
        let tasks = snapshot::decode(raw).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Persist me");
    }

    #[test]
    fn test_no_write_before_load() {
        let mut store = TaskStore::new(MemorySlot::new());
        store.add("Too early", None, None).unwrap();

        assert!(store.slot().get(TASKS_KEY).is_none());
    }

    #[test]
    fn test_load_runs_once() {
        let mut store = TaskStore::new(MemorySlot::new());
        assert!(store.load());
        store.add("Kept", None, None).unwrap();
        assert!(!store.load());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_corrupt_slot_loads_empty() {
        let slot = MemorySlot::new().with_value(TASKS_KEY, "{{{ nope");
        let store = TaskStore::open(slot);

        assert!(store.is_loaded());
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut store = store();
        store.add("Only", None, None).unwrap();
        let before = store.slot().get(TASKS_KEY).unwrap().to_string();
        let ghost = TaskId::new();

        assert!(!store.toggle_done(&ghost));
        assert!(!store.toggle_do_later(&ghost));
        assert!(!store.delete(&ghost));
        assert!(!store.edit(&ghost, "x", Some(None), Some(String::new())));
        assert!(!store.update_checklist(&ghost, vec![ChecklistItem::new("x")]));
        assert!(!store.update_finish_before(&ghost, Some(fixed_now())));
        assert!(!store.add_checklist_item(&ghost, "x").unwrap());

        assert_eq!(store.len(), 1);
        assert_eq!(store.slot().get(TASKS_KEY).unwrap(), before);
        assert_eq!(snapshot::encode(store.tasks().as_slice()).unwrap(), before);
    }

    #[test]
    fn test_checklist_item_helpers() {
        let mut store = store();
        let id = store.add("Groceries", None, None).unwrap();

        assert!(store.add_checklist_item(&id, "milk").unwrap());
        assert!(store.add_checklist_item(&id, "eggs").unwrap());
        assert!(store.toggle_checklist_item(&id, 0).unwrap());
        assert!(store.remove_checklist_item(&id, 1).unwrap());

        let task = store.get(&id).unwrap();
        assert_eq!(
            task.checklist,
            vec![ChecklistItem {
                text: "milk".to_string(),
                checked: true
            }]
        );
    }

    #[test]
    fn test_checklist_bad_index_untouched() {
        let mut store = store();
        let id = store.add("Groceries", None, None).unwrap();
        store.add_checklist_item(&id, "milk").unwrap();
        let before = store.snapshot();

        assert!(store.toggle_checklist_item(&id, 5).is_err());
        assert!(store.remove_checklist_item(&id, 1).is_err());

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let mut store = store();
        let id = store.add("Task", None, None).unwrap();
        let old = store.snapshot();

        store.toggle_done(&id);

        assert!(!old.get(&id).unwrap().done);
        assert!(store.get(&id).unwrap().done);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |tasks| sink.borrow_mut().push(tasks.len()));

        let id = store.add("One", None, None).unwrap();
        store.toggle_done(&id);
        store.toggle_done(&TaskId::new());
        assert!(store.unsubscribe(sub));
        store.add("Two", None, None).unwrap();

        assert_eq!(*seen.borrow(), vec![1, 1]);
        assert!(!store.unsubscribe(sub));
    }

    #[test]
    fn test_clear_done() {
        let mut store = store();
        let a = store.add("a", None, None).unwrap();
        store.add("b", None, None).unwrap();
        store.toggle_done(&a);

        assert_eq!(store.clear_done(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.clear_done(), 0);
    }

    #[test]
    fn test_write_failure_keeps_memory() {
        let mut store = TaskStore::open(FailingSlot);
        assert!(store.is_loaded());

        let id = store.add("Still here", None, None).unwrap();

        assert!(store.get(&id).is_some());
        assert!(matches!(
            store.take_persist_error(),
            Some(CoreError::Storage { .. })
        ));
        assert!(store.take_persist_error().is_none());
    }

    fn precise_now() -> DateTime<Utc> {
        Utc.timestamp_nanos(1_750_000_000_123_456_789)
    }

    #[test]
    fn test_injected_clock_truncated_to_millis() {
        let mut store = TaskStore::open(MemorySlot::new()).with_clock(precise_now);
        let id = store.add("Precise", None, None).unwrap();
        store.edit(&id, "Still precise", None, None);

        let task = store.get(&id).unwrap();
        assert_eq!(task.created_at.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(task.last_modified.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(task.history[0].at.timestamp_subsec_nanos(), 123_000_000);

        let reopened = TaskStore::open(store.slot().clone());
        assert_eq!(reopened.snapshot(), store.snapshot());
    }

    #[test]
    fn test_finish_before_truncated_to_millis() {
        let mut store = store();
        let id = store.add("Deadline", None, None).unwrap();
        let precise = Utc.timestamp_nanos(1_750_000_000_123_456_789);

        store.update_finish_before(&id, Some(precise));

        let stored = store.get(&id).unwrap().finish_before.unwrap();
        assert_eq!(stored.timestamp_millis(), 1_750_000_000_123);
        assert_eq!(stored.timestamp_subsec_nanos(), 123_000_000);
    }
}
