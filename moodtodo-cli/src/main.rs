use std::io::{self, Write};

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use moodtodo_core::date::{format_timestamp, parse_deadline};
use moodtodo_core::{
    FilterExt, Mood, SnapshotSlot, StatusFilter, TaskFilter, TaskId, TaskSort, TaskStore, snapshot,
};

use crate::cli::{ChecklistAction, Cli, Commands, SortBy, StatusArg};
use crate::display::{DisplayMode, format_summary, format_task, format_task_detailed, supports_color};
use crate::error::{CliError, Result};
use crate::storage::JsonFileSlot;

mod cli;
mod config;
mod display;
mod error;
mod storage;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moodtodo=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cfg: config::Config = confy::load("moodtodo", None)?;
    let slot = JsonFileSlot::new(cfg.data_path()).with_backup(cfg.backup);
    let mut store = TaskStore::new(slot).with_key(&cfg.slot_key);
    store.load();

    match cli.command {
        Commands::Add {
            text,
            mood,
            description,
        } => {
            let text = text.join(" ");
            let mood = mood.as_deref().map(str::parse::<Mood>).transpose()?;

            let id = store.add(&text, mood, description)?;
            finish(&mut store)?;
            println!("Task added [{}]: {}", id.short(), text.trim());
        }

        Commands::List {
            status,
            mood,
            search,
            overdue,
            sort,
            reverse,
            compact,
            detailed,
            no_color,
        } => {
            let status = match status {
                StatusArg::All => StatusFilter::All,
                StatusArg::Active => StatusFilter::Active,
                StatusArg::Later => StatusFilter::Later,
                StatusArg::Done => StatusFilter::Done,
            };
            let sort = match sort {
                SortBy::Created => TaskSort::Created,
                SortBy::Modified => TaskSort::Modified,
                SortBy::Name => TaskSort::Name,
                SortBy::Deadline => TaskSort::Deadline,
            };
            let mood = mood.as_deref().map(str::parse::<Mood>).transpose()?;

            let filter = TaskFilter::new()
                .with_status(status)
                .with_mood(mood)
                .with_search(search)
                .with_overdue(overdue)
                .sort_by(sort)
                .with_reverse(reverse);

            let current = store.snapshot();
            let tasks = current.get_filtered(&filter);

            if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                let mode = if compact {
                    DisplayMode::Compact
                } else if detailed {
                    DisplayMode::Detailed
                } else {
                    DisplayMode::Default
                };

                let use_color = !no_color && supports_color();

                for task in &tasks {
                    println!("{}", format_task(task, mode, use_color));
                }

                println!();
                let buckets = current.buckets();
                let summary = format_summary(
                    current.len(),
                    buckets.active.len(),
                    buckets.later.len(),
                    buckets.done.len(),
                    current.count_overdue(Utc::now()),
                    use_color,
                );
                println!("{}", summary);
            }
        }

        Commands::Show { id } => {
            let task = store.resolve(&id)?;
            println!("{}", format_task_detailed(task, supports_color()));
        }

        Commands::Done { id } => {
            let id = resolve_id(&store, &id)?;
            store.toggle_done(&id);
            finish(&mut store)?;
            let task = store.tasks().get_or_err(&id)?;
            let status = if task.done { "done" } else { "open" };
            println!("Marked task {} as {}: {}", id.short(), status, task.text);
        }

        Commands::Later { id } => {
            let id = resolve_id(&store, &id)?;
            store.toggle_do_later(&id);
            finish(&mut store)?;
            let task = store.tasks().get_or_err(&id)?;
            if task.do_later {
                println!("Deferred task {}: {}", id.short(), task.text);
            } else {
                println!("Task {} is active again: {}", id.short(), task.text);
            }
        }

        Commands::Remove { id } => {
            let id = resolve_id(&store, &id)?;
            let text = store.tasks().get_or_err(&id)?.text.clone();
            store.delete(&id);
            finish(&mut store)?;
            println!("Removed: {}", text);
        }

        Commands::Edit {
            id,
            text,
            mood,
            description,
        } => {
            if text.is_none() && mood.is_none() && description.is_none() {
                return Err(CliError::validation(
                    "edit",
                    "At least one of --text, --mood or --description must be provided",
                ));
            }

            let id = resolve_id(&store, &id)?;
            let mood = match mood.as_deref() {
                None => None,
                Some(m) if m.eq_ignore_ascii_case("none") => Some(None),
                Some(m) => Some(Some(m.parse::<Mood>()?)),
            };
            // No new text means "keep the current one"
            let text = text.unwrap_or_default();

            store.edit(&id, &text, mood, description);
            finish(&mut store)?;

            let task = store.tasks().get_or_err(&id)?;
            println!("Updated task {}: {}", id.short(), task.text);
        }

        Commands::Deadline { id, when } => {
            let id = resolve_id(&store, &id)?;
            let when = when.join(" ");

            if when.eq_ignore_ascii_case("none") {
                store.update_finish_before(&id, None);
                finish(&mut store)?;
                println!("Cleared deadline for task {}", id.short());
            } else {
                let deadline = parse_deadline(&when)?;
                store.update_finish_before(&id, Some(deadline));
                finish(&mut store)?;
                println!(
                    "Task {} must be finished before {}",
                    id.short(),
                    format_timestamp(deadline)
                );
                if !store.tasks().get_or_err(&id)?.do_later {
                    println!("(the deadline shows once the task is deferred with 'later')");
                }
            }
        }

        Commands::Checklist { id, action } => {
            let id = resolve_id(&store, &id)?;

            match action {
                ChecklistAction::Add { text } => {
                    store.add_checklist_item(&id, &text.join(" "))?;
                }
                ChecklistAction::Toggle { item } => {
                    store.toggle_checklist_item(&id, item as usize - 1)?;
                }
                ChecklistAction::Remove { item } => {
                    store.remove_checklist_item(&id, item as usize - 1)?;
                }
            }
            finish(&mut store)?;

            let task = store.tasks().get_or_err(&id)?;
            println!("{}", format_task_detailed(task, supports_color()));
        }

        Commands::History { id } => {
            let task = store.resolve(&id)?;

            if task.history.is_empty() {
                println!("Task {} has never been edited.", task.id.short());
            } else {
                for entry in &task.history {
                    println!("{}  {}", format_timestamp(entry.at), entry.text);
                }
                println!("{}  {} (current)", format_timestamp(task.last_modified), task.text);
            }
        }

        Commands::Clear { done, force } => {
            if !done {
                return Err(CliError::validation(
                    "clear",
                    "Use --done to remove completed tasks",
                ));
            }

            let count = store.tasks().count_done();

            if count == 0 {
                println!("No completed tasks to remove.");
                return Ok(());
            }

            if !force && !confirm(&format!("Remove {} completed task(s)?", count))? {
                println!("Cancelled.");
                return Ok(());
            }

            let removed = store.clear_done();
            finish(&mut store)?;
            println!("Removed {} completed task(s).", removed);
        }

        Commands::Recover { force } => {
            if !store.slot().backup_exists(&cfg.slot_key) {
                return Err(CliError::storage("No backup file found"));
            }

            if !force && !confirm("Restore tasks from backup? Current tasks will be replaced.")? {
                println!("Cancelled.");
                return Ok(());
            }

            let tasks = store.slot().recover(&cfg.slot_key)?;
            store.replace_all(tasks);
            finish(&mut store)?;
            println!("Recovered {} tasks from backup.", store.len());
        }

        Commands::Export => {
            println!("{}", snapshot::encode_pretty(store.tasks().as_slice())?);
        }
    }

    Ok(())
}

/// Resolve a full id or unique id prefix to a task id
fn resolve_id<S: SnapshotSlot>(store: &TaskStore<S>, prefix: &str) -> Result<TaskId> {
    Ok(store.resolve(prefix)?.id)
}

/// Surface a failed save; the change itself is already applied in memory
fn finish<S: SnapshotSlot>(store: &mut TaskStore<S>) -> Result<()> {
    match store.take_persist_error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Ask user for confirmation
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y")
}
