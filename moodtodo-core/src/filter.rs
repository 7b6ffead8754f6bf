//! Task filtering, sorting and bucketing
//!
//! Provides a builder-style API for filtering and sorting tasks, plus the
//! active / later / done partition.

use chrono::{DateTime, Utc};

use crate::task::{Mood, Task, TaskCollection};

/// The three mutually exclusive task buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Not done and not deferred
    Active,
    /// Deferred and not done
    Later,
    /// Done (regardless of the deferred flag)
    Done,
}

impl Bucket {
    /// Classify a done / do-later flag pair
    pub fn of(done: bool, do_later: bool) -> Self {
        match (done, do_later) {
            (true, _) => Bucket::Done,
            (false, true) => Bucket::Later,
            (false, false) => Bucket::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Active => "active",
            Bucket::Later => "later",
            Bucket::Done => "done",
        }
    }
}

/// Tasks split into their buckets, each keeping collection order
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    pub active: Vec<&'a Task>,
    pub later: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> Buckets<'a> {
    pub fn partition(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut buckets = Buckets::default();
        for task in tasks {
            match task.bucket() {
                Bucket::Active => buckets.active.push(task),
                Bucket::Later => buckets.later.push(task),
                Bucket::Done => buckets.done.push(task),
            }
        }
        buckets
    }
}

/// Status filter over buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Later,
    Done,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => task.bucket() == Bucket::Active,
            StatusFilter::Later => task.bucket() == Bucket::Later,
            StatusFilter::Done => task.bucket() == Bucket::Done,
        }
    }
}

/// Sort order for tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Collection (creation) order
    #[default]
    Created,
    Modified,
    Name,
    /// Earliest deadline first, tasks without a deadline last
    Deadline,
}

/// Builder for filtering tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub mood: Option<Mood>,
    /// Search term for text and description (case-insensitive)
    pub search: Option<String>,
    /// Filter to only show overdue tasks
    pub overdue: bool,
    pub sort: TaskSort,
    pub reverse: bool,
}

impl TaskFilter {
    /// Create a new filter with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Only tasks tagged with `mood` (`None` = any mood)
    pub fn with_mood(mut self, mood: Option<Mood>) -> Self {
        self.mood = mood;
        self
    }

    /// Filter by search term
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Set search term
    pub fn with_search(mut self, term: Option<String>) -> Self {
        self.search = term;
        self
    }

    /// Filter to only show overdue tasks
    pub fn overdue_only(mut self) -> Self {
        self.overdue = true;
        self
    }

    /// Set overdue filter
    pub fn with_overdue(mut self, overdue: bool) -> Self {
        self.overdue = overdue;
        self
    }

    /// Sort by given field
    pub fn sort_by(mut self, sort: TaskSort) -> Self {
        self.sort = sort;
        self
    }

    /// Set reverse flag
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Check if a task matches this filter at time `now`
    pub fn matches_at(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if !self.status.matches(task) {
            return false;
        }

        if let Some(mood) = self.mood
            && task.mood != Some(mood)
        {
            return false;
        }

        if self.overdue && !task.is_overdue(now) {
            return false;
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !task.text.to_lowercase().contains(&term)
                && !task.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        true
    }

    /// Check if a task matches this filter now
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_at(task, Utc::now())
    }

    /// Apply filter and sort to a sequence of tasks
    pub fn apply<'a>(&self, tasks: impl Iterator<Item = &'a Task>) -> Vec<&'a Task> {
        let now = Utc::now();
        let mut filtered: Vec<&Task> = tasks.filter(|t| self.matches_at(t, now)).collect();

        // Stable sorts keep collection order for ties
        match self.sort {
            TaskSort::Created => {}
            TaskSort::Modified => filtered.sort_by_key(|t| std::cmp::Reverse(t.last_modified)),
            TaskSort::Name => filtered.sort_by_key(|t| t.text.to_lowercase()),
            TaskSort::Deadline => filtered.sort_by(|a, b| match (&a.finish_before, &b.finish_before) {
                (Some(a_dt), Some(b_dt)) => a_dt.cmp(b_dt),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }),
        }

        if self.reverse {
            filtered.reverse();
        }

        filtered
    }
}

/// Extension trait for TaskCollection to support filtering
pub trait FilterExt {
    /// Get tasks filtered and sorted according to the filter
    fn get_filtered(&self, filter: &TaskFilter) -> Vec<&Task>;

    /// Split tasks into active / later / done
    fn buckets(&self) -> Buckets<'_>;
}

impl FilterExt for TaskCollection {
    fn get_filtered(&self, filter: &TaskFilter) -> Vec<&Task> {
        filter.apply(self.iter())
    }

    fn buckets(&self) -> Buckets<'_> {
        Buckets::partition(self)
    }
}
