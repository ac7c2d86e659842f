//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use pocketlife_core::RecordId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pocketlife")]
#[command(about = "Notes and budget with a restorable trash")]
#[command(version)]
pub struct Cli {
    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// JSON file with `retention_days` and `sweep_interval_hours`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the trash retention period
    #[arg(long, global = true)]
    pub retention_days: Option<u32>,

    /// trace | debug | info | warn | error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for rotating log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, edit and trash notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Record income and expenses
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Inspect or empty the trash
    #[command(subcommand)]
    Trash(TrashCommand),
    /// Purge trashed records older than the retention period
    Sweep,
    /// Sweep periodically until stdin closes or a line is entered
    Watch,
}

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Create a note
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// List active notes
    List(ScopeArgs),
    /// Replace title and content of an active note
    Edit {
        id: RecordId,
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Move a note to the trash
    Rm { id: RecordId },
    /// Bring a note back from the trash
    Restore { id: RecordId },
    /// Permanently delete a trashed note
    Purge { id: RecordId },
}

#[derive(Subcommand)]
pub enum BudgetCommand {
    /// Record an expense (or income with --income)
    Add {
        title: String,
        amount_cents: i64,
        #[arg(long)]
        income: bool,
        #[arg(long)]
        category: Option<String>,
    },
    /// List active budget items
    List(ScopeArgs),
    /// Income minus expenses over active items
    Balance(ScopeArgs),
    /// Move an item to the trash
    Rm { id: RecordId },
    /// Bring an item back from the trash
    Restore { id: RecordId },
    /// Permanently delete a trashed item
    Purge { id: RecordId },
}

#[derive(Subcommand)]
pub enum TrashCommand {
    /// List trashed notes and budget items
    List(ScopeArgs),
    /// Permanently delete everything in the trash
    Empty(ScopeArgs),
}

#[derive(Args)]
pub struct ScopeArgs {
    /// Only records in this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,
}
