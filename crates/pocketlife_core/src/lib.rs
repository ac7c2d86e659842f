//! Core domain logic for PocketLife.
//! Owns the soft-delete lifecycle of notes and budget items and the
//! storage those records live in.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LifecycleConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::budget::{BudgetItem, EntryKind};
pub use model::deletion::{DeletableRecord, DeletionState, RecordId, RecordKind};
pub use model::note::Note;
pub use model::RecordValidationError;
pub use repo::budget_repo::SqliteBudgetRepository;
pub use repo::note_repo::SqliteNoteRepository;
pub use repo::{DeletionFilter, RecordFilter, RecordStore, RepoError, RepoResult, TrashScope};
pub use schedule::periodic::{PeriodicSweep, PeriodicSweepStats};
pub use schedule::{pass_status, ExpirySweep, SweepSchedule, SweepTrigger};
pub use service::budget_service::{BudgetEntryRequest, BudgetService, BudgetServiceError};
pub use service::lifecycle_service::{
    LifecycleError, LifecycleService, PurgeFailure, PurgeOutcome, SweepReport,
};
pub use service::note_service::{NoteService, NoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
