use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "moodtodo")]
#[command(about = "Track tasks by mood: active, later, done")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    "v",
    env!("CARGO_PKG_VERSION"),
    "\nCodeName: ",
    env!("CODENAME")
))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    All,
    Active,
    Later,
    Done,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortBy {
    Created,
    Modified,
    Name,
    Deadline,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Adds a task
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Mood tag (happy, stressful, creative, boring, urgent)
        #[arg(long, short = 'm', value_name = "MOOD")]
        mood: Option<String>,
        /// Free-form description
        #[arg(long, short = 'd', value_name = "TEXT")]
        description: Option<String>,
    },

    /// Lists tasks with filtering and sorting
    List {
        /// Show only tasks in this bucket
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,
        /// Show only tasks with this mood
        #[arg(long, short = 'm', value_name = "MOOD")]
        mood: Option<String>,
        /// Filter tasks containing text (case-insensitive)
        #[arg(long, short = 's', value_name = "TERM")]
        search: Option<String>,
        /// Show only overdue tasks
        #[arg(long)]
        overdue: bool,
        /// Sort tasks by field
        #[arg(long, value_enum, default_value = "created")]
        sort: SortBy,
        /// Reverse sort order
        #[arg(long, short = 'r')]
        reverse: bool,
        /// Use compact one-line format
        #[arg(long, short = 'c')]
        compact: bool,
        /// Use detailed format with full info
        #[arg(long)]
        detailed: bool,
        /// Disable colors
        #[arg(long)]
        no_color: bool,
    },

    /// Shows every field of a task
    Show { id: String },

    /// Toggles task completion status
    Done { id: String },

    /// Toggles the "do later" flag
    Later { id: String },

    /// Removes a task
    Remove { id: String },

    /// Edit a task's text, mood and/or description
    Edit {
        id: String,
        /// New task text
        #[arg(long, short = 't', value_name = "TEXT")]
        text: Option<String>,
        /// New mood (use 'none' to clear)
        #[arg(long, short = 'm', value_name = "MOOD")]
        mood: Option<String>,
        /// New description (an empty string clears it)
        #[arg(long, short = 'd', value_name = "TEXT")]
        description: Option<String>,
    },

    /// Set the "finish before" deadline (use 'none' to clear)
    Deadline {
        id: String,
        #[arg(required = true, num_args = 1..)]
        when: Vec<String>,
    },

    /// Manage a task's checklist
    Checklist {
        id: String,
        #[command(subcommand)]
        action: ChecklistAction,
    },

    /// Show the previous texts of a task
    History { id: String },

    /// Clear completed tasks
    Clear {
        /// Remove done tasks
        #[arg(long)]
        done: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Recover tasks from backup file
    Recover {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Print the stored snapshot as JSON
    Export,
}

/// Checklist subcommands (item numbers start at 1)
#[derive(Subcommand)]
pub enum ChecklistAction {
    /// Append an item
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Check or uncheck an item
    Toggle {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        item: u32,
    },
    /// Remove an item
    Remove {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        item: u32,
    },
}
