use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use moodtodo_core::{
    Bucket, ChecklistItem, FilterExt, MemorySlot, Mood, Result, SnapshotSlot, TASKS_KEY, Task,
    TaskStore, date, snapshot,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Read,
    Write(String),
}

/// Memory slot that records every access in order
#[derive(Clone, Default)]
struct RecordingSlot {
    inner: MemorySlot,
    events: Rc<RefCell<Vec<Event>>>,
}

impl SnapshotSlot for RecordingSlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.events.borrow_mut().push(Event::Read);
        self.inner.read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.events.borrow_mut().push(Event::Write(value.to_string()));
        self.inner.write(key, value)
    }
}

fn seeded(tasks: &[Task]) -> RecordingSlot {
    RecordingSlot {
        inner: MemorySlot::new().with_value(TASKS_KEY, snapshot::encode(tasks).unwrap()),
        events: Rc::default(),
    }
}

#[test]
fn test_load_before_save() {
    let persisted = vec![
        Task::new("Water plants", date::now()).with_mood(Some(Mood::Boring)),
        Task::new("Ship release", date::now()).with_done(true),
    ];
    let slot = seeded(&persisted);
    let events = Rc::clone(&slot.events);

    let mut store = TaskStore::new(slot);
    let notified = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&notified);
    store.subscribe(move |tasks| sink.borrow_mut().push(tasks.as_slice().to_vec()));

    // A mutation before load stays in memory and never reaches the slot
    store.add("Scratch", None, None).unwrap();
    assert!(events.borrow().is_empty());

    assert!(store.load());

    assert_eq!(store.tasks().as_slice(), persisted.as_slice());
    assert_eq!(events.borrow().as_slice(), &[Event::Read]);
    assert_eq!(notified.borrow().last().unwrap(), &persisted);

    let id = persisted[0].id;
    store.toggle_done(&id);
    let writes: Vec<Event> = events.borrow()[1..].to_vec();
    assert_eq!(writes.len(), 1);
    assert!(matches!(&writes[0], Event::Write(raw) if raw.contains("Water plants")));
}

#[test]
fn test_reopen_round_trip() {
    let slot = RecordingSlot::default();
    let mut store = TaskStore::open(slot.clone());
    let id = store.add("Plan trip", Some(Mood::Creative), Some("Lisbon".into())).unwrap();
    store.toggle_do_later(&id);
    store.add_checklist_item(&id, "flights").unwrap();
    store.edit(&id, "Plan summer trip", None, None);
    store.add("Bare", None, None).unwrap();
    let expected = store.snapshot();

    let reopened = TaskStore::open(store.slot().clone());

    assert_eq!(reopened.snapshot(), expected);
}

#[test]
fn test_missing_id_leaves_bytes_identical() {
    let mut store = TaskStore::open(RecordingSlot::default());
    let id = store.add("Real", None, None).unwrap();
    store.add_checklist_item(&id, "step").unwrap();
    let before = snapshot::encode(store.tasks().as_slice()).unwrap();
    let writes_before = store.slot().events.borrow().len();

    let ghost = moodtodo_core::TaskId::new();
    store.toggle_done(&ghost);
    store.toggle_do_later(&ghost);
    store.delete(&ghost);
    store.edit(&ghost, "nope", Some(Some(Mood::Happy)), Some("x".into()));
    store.update_checklist(&ghost, vec![ChecklistItem::new("x")]);
    store.update_finish_before(&ghost, None);
    store.toggle_checklist_item(&ghost, 0).unwrap();
    store.remove_checklist_item(&ghost, 0).unwrap();

    assert_eq!(snapshot::encode(store.tasks().as_slice()).unwrap(), before);
    assert_eq!(store.slot().events.borrow().len(), writes_before);
}

#[test]
fn test_monotonic_history() {
    let mut store = TaskStore::open(MemorySlot::new());
    let id = store.add("v0", None, None).unwrap();

    for n in 1..=5 {
        store.edit(&id, &format!("v{}", n), None, None);
        let task = store.get(&id).unwrap();
        assert_eq!(task.history.len(), n);
        assert_eq!(task.history[n - 1].text, format!("v{}", n - 1));
    }

    let task = store.get(&id).unwrap();
    assert_eq!(task.text, "v5");
    let texts: Vec<&str> = task.history.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(texts, vec!["v0", "v1", "v2", "v3", "v4"]);
    assert!(task.history.windows(2).all(|w| w[0].at <= w[1].at));
}

#[test]
fn test_bucket_exclusive_through_store() {
    let mut store = TaskStore::open(MemorySlot::new());
    let active = store.add("active", None, None).unwrap();
    let later = store.add("later", None, None).unwrap();
    let done = store.add("done", None, None).unwrap();
    let both = store.add("both", None, None).unwrap();
    store.toggle_do_later(&later);
    store.toggle_done(&done);
    store.toggle_do_later(&both);
    store.toggle_done(&both);

    let tasks = store.snapshot();
    let buckets = tasks.buckets();

    assert_eq!(buckets.active.iter().map(|t| t.id).collect::<Vec<_>>(), vec![active]);
    assert_eq!(buckets.later.iter().map(|t| t.id).collect::<Vec<_>>(), vec![later]);
    assert_eq!(buckets.done.iter().map(|t| t.id).collect::<Vec<_>>(), vec![done, both]);
    assert_eq!(store.get(&both).unwrap().bucket(), Bucket::Done);
}

#[test]
fn test_buy_milk_scenario() {
    let mut store = TaskStore::open(MemorySlot::new());
    let id = store.add("Buy milk", Some(Mood::Urgent), None).unwrap();

    let task = store.get(&id).unwrap();
    assert!(!task.done);
    assert!(!task.do_later);
    assert_eq!(task.mood, Some(Mood::Urgent));
    assert!(task.checklist.is_empty());
    assert!(task.history.is_empty());

    assert!(store.toggle_do_later(&id));
    assert!(store.get(&id).unwrap().do_later);

    let deadline: DateTime<Utc> = "2025-01-01T10:00:00.000Z".parse().unwrap();
    assert!(store.update_finish_before(&id, Some(deadline)));

    let task = store.get(&id).unwrap();
    assert_eq!(task.finish_before, Some(deadline));
    assert!(task.do_later);
    assert!(!task.done);

    let raw = store.slot().get(TASKS_KEY).unwrap();
    let reloaded = snapshot::decode(raw).unwrap();
    assert_eq!(reloaded[0].finish_before, Some(deadline));
}

#[test]
fn test_write_report_scenario() {
    let mut store = TaskStore::open(MemorySlot::new());
    let id = store.add("Write report", None, None).unwrap();

    let task = store.get(&id).unwrap();
    assert!(task.mood.is_none());
    assert_eq!(task.description, "");

    assert!(store.edit(&id, "Write final report", None, None));

    let task = store.get(&id).unwrap();
    assert_eq!(task.text, "Write final report");
    assert!(task.mood.is_none());
    assert_eq!(task.description, "");
    assert_eq!(task.history.len(), 1);
    assert_eq!(task.history[0].text, "Write report");
}
