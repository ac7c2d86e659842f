//! Subcommand execution against one open database.

use crate::cli::{BudgetCommand, Commands, NoteCommand, ScopeArgs, TrashCommand};
use anyhow::{bail, Context};
use log::{error, info};
use pocketlife_core::db::open_db;
use pocketlife_core::{
    BudgetEntryRequest, BudgetItem, BudgetService, DeletionState, EntryKind, LifecycleConfig,
    LifecycleService, Note, NoteService, PeriodicSweep, PurgeOutcome, RecordId,
    SqliteBudgetRepository, SqliteNoteRepository, SweepReport, SweepSchedule, SweepTrigger,
    SystemClock, TrashScope,
};
use rusqlite::Connection;
use std::path::Path;

/// Record stores and settings shared by every subcommand.
pub struct Session<'conn> {
    notes: SqliteNoteRepository<'conn>,
    budget: SqliteBudgetRepository<'conn>,
    config: LifecycleConfig,
}

impl<'conn> Session<'conn> {
    pub fn open(conn: &'conn Connection, config: LifecycleConfig) -> anyhow::Result<Self> {
        Ok(Self {
            notes: SqliteNoteRepository::try_new(conn)?,
            budget: SqliteBudgetRepository::try_new(conn)?,
            config,
        })
    }

    fn note_lifecycle(&self) -> LifecycleService<&SqliteNoteRepository<'conn>> {
        LifecycleService::with_system_clock(&self.notes)
    }

    fn budget_lifecycle(&self) -> LifecycleService<&SqliteBudgetRepository<'conn>> {
        LifecycleService::with_system_clock(&self.budget)
    }

    /// Sweeps expired trash for all record kinds once.
    pub fn sweep(&self, trigger: SweepTrigger) -> Vec<SweepReport> {
        let notes = self.note_lifecycle();
        let budget = self.budget_lifecycle();
        let mut schedule = SweepSchedule::new(self.config.retention());
        schedule.register(&notes).register(&budget);
        schedule.run(trigger)
    }
}

pub fn run(session: &Session<'_>, db_path: &Path, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Note(command) => run_note(session, command),
        Commands::Budget(command) => run_budget(session, command),
        Commands::Trash(command) => run_trash(session, command),
        Commands::Sweep => {
            let reports = session.sweep(SweepTrigger::Manual);
            print_sweep_reports(&reports);
            Ok(())
        }
        Commands::Watch => watch(db_path, session.config),
    }
}

fn run_note(session: &Session<'_>, command: NoteCommand) -> anyhow::Result<()> {
    let notes = NoteService::new(&session.notes, SystemClock);
    let lifecycle = session.note_lifecycle();

    match command {
        NoteCommand::Add {
            title,
            content,
            category,
        } => {
            let note = notes.create_note(&title, content, category.as_deref())?;
            println!("{}", note.id);
        }
        NoteCommand::List(scope) => {
            for note in notes.list_notes(&scope_of(&scope))? {
                print_note(&note);
            }
        }
        NoteCommand::Edit { id, title, content } => {
            let note = notes.update_note(id, &title, content)?;
            print_note(&note);
        }
        NoteCommand::Rm { id } => {
            lifecycle.soft_delete(id)?;
            println!("moved note {id} to trash");
        }
        NoteCommand::Restore { id } => match lifecycle.restore(id)? {
            Some(_) => println!("restored note {id}"),
            None => bail!("note {id} no longer exists"),
        },
        NoteCommand::Purge { id } => print_purge("note", id, lifecycle.purge(id)?),
    }
    Ok(())
}

fn run_budget(session: &Session<'_>, command: BudgetCommand) -> anyhow::Result<()> {
    let budget = BudgetService::new(&session.budget, SystemClock);
    let lifecycle = session.budget_lifecycle();

    match command {
        BudgetCommand::Add {
            title,
            amount_cents,
            income,
            category,
        } => {
            let kind = if income {
                EntryKind::Income
            } else {
                EntryKind::Expense
            };
            let item = budget.record_entry(&BudgetEntryRequest {
                title,
                amount_cents,
                kind,
                category,
            })?;
            println!("{}", item.id);
        }
        BudgetCommand::List(scope) => {
            for item in budget.list_items(&scope_of(&scope))? {
                print_item(&item);
            }
        }
        BudgetCommand::Balance(scope) => {
            println!("{}", format_cents(budget.balance(&scope_of(&scope))?));
        }
        BudgetCommand::Rm { id } => {
            lifecycle.soft_delete(id)?;
            println!("moved budget item {id} to trash");
        }
        BudgetCommand::Restore { id } => match lifecycle.restore(id)? {
            Some(_) => println!("restored budget item {id}"),
            None => bail!("budget item {id} no longer exists"),
        },
        BudgetCommand::Purge { id } => print_purge("budget item", id, lifecycle.purge(id)?),
    }
    Ok(())
}

fn run_trash(session: &Session<'_>, command: TrashCommand) -> anyhow::Result<()> {
    match command {
        TrashCommand::List(scope) => {
            let scope = scope_of(&scope);
            let notes = NoteService::new(&session.notes, SystemClock).list_trash(&scope)?;
            let items = BudgetService::new(&session.budget, SystemClock).list_trash(&scope)?;
            for note in &notes {
                print_note(note);
            }
            for item in &items {
                print_item(item);
            }
            if notes.is_empty() && items.is_empty() {
                println!("trash is empty");
            }
        }
        TrashCommand::Empty(scope) => {
            let scope = scope_of(&scope);
            let reports = [
                session.note_lifecycle().empty_trash(&scope),
                session.budget_lifecycle().empty_trash(&scope),
            ];
            print_sweep_reports(&reports);
            if reports.iter().any(|report| !report.is_clean()) {
                bail!("some trashed records could not be purged");
            }
        }
    }
    Ok(())
}

/// Runs interval sweeps on a dedicated connection until stdin yields a line
/// or closes.
fn watch(db_path: &Path, config: LifecycleConfig) -> anyhow::Result<()> {
    let job_conn = open_db(db_path)
        .with_context(|| format!("failed to open `{}` for sweeping", db_path.display()))?;
    let retention = config.retention();

    let task = PeriodicSweep::spawn(config.sweep_interval(), move || {
        let notes = match SqliteNoteRepository::try_new(&job_conn) {
            Ok(repo) => repo,
            Err(err) => {
                error!("event=sweep_pass module=cli status=error error={err}");
                return;
            }
        };
        let budget = match SqliteBudgetRepository::try_new(&job_conn) {
            Ok(repo) => repo,
            Err(err) => {
                error!("event=sweep_pass module=cli status=error error={err}");
                return;
            }
        };
        let note_lifecycle = LifecycleService::with_system_clock(&notes);
        let budget_lifecycle = LifecycleService::with_system_clock(&budget);
        let mut schedule = SweepSchedule::new(retention);
        schedule
            .register(&note_lifecycle)
            .register(&budget_lifecycle);
        schedule.on_interval();
    })
    .context("failed to start periodic sweep")?;

    println!(
        "sweeping every {}h with {}-day retention; press Enter to stop",
        config.sweep_interval_hours, config.retention_days
    );
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    let stats = task.stop();
    info!("event=watch module=cli status=stopped runs={}", stats.runs);
    println!("stopped after {} sweep(s)", stats.runs);
    Ok(())
}

fn scope_of(args: &ScopeArgs) -> TrashScope {
    args.category
        .as_deref()
        .map_or_else(TrashScope::all, TrashScope::category)
}

fn print_note(note: &Note) {
    println!(
        "{}  {}{}{}",
        note.id,
        note.title,
        category_suffix(note.category.as_deref()),
        deletion_suffix(note.deletion)
    );
}

fn print_item(item: &BudgetItem) {
    println!(
        "{}  {:>12}  {}{}{}",
        item.id,
        format_cents(item.signed_amount()),
        item.title,
        category_suffix(item.category.as_deref()),
        deletion_suffix(item.deletion)
    );
}

fn print_purge(label: &str, id: RecordId, outcome: PurgeOutcome) {
    match outcome {
        PurgeOutcome::Purged => println!("purged {label} {id}"),
        PurgeOutcome::AlreadyAbsent => println!("{label} {id} was already gone"),
    }
}

fn print_sweep_reports(reports: &[SweepReport]) {
    for report in reports {
        println!(
            "{}: purged {} of {} ({} already gone, {} failed)",
            report.kind,
            report.purged,
            report.attempted,
            report.already_absent,
            report.failures.len()
        );
        for failure in &report.failures {
            match failure.id {
                Some(id) => eprintln!("  {id}: {}", failure.error),
                None => eprintln!("  {}", failure.error),
            }
        }
    }
}

fn category_suffix(category: Option<&str>) -> String {
    category.map(|name| format!("  [{name}]")).unwrap_or_default()
}

fn deletion_suffix(deletion: DeletionState) -> String {
    match deletion {
        DeletionState::Active => String::new(),
        DeletionState::Deleted { deleted_at } => format!("  (deleted_at={deleted_at})"),
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::{format_cents, scope_of, Session};
    use crate::cli::ScopeArgs;
    use pocketlife_core::db::open_db_in_memory;
    use pocketlife_core::{pass_status, LifecycleConfig, RecordKind, SweepTrigger, TrashScope};

    #[test]
    fn manual_sweep_covers_notes_and_budget() {
        let conn = open_db_in_memory().unwrap();
        let session = Session::open(&conn, LifecycleConfig::default()).unwrap();

        let reports = session.sweep(SweepTrigger::Manual);

        let kinds: Vec<_> = reports.iter().map(|report| report.kind).collect();
        assert_eq!(kinds, vec![RecordKind::Note, RecordKind::BudgetItem]);
        assert_eq!(pass_status(&reports), "ok");
    }

    #[test]
    fn cents_render_with_two_decimals() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(1_205), "12.05");
        assert_eq!(format_cents(-99), "-0.99");
    }

    #[test]
    fn missing_category_scopes_whole_trash() {
        assert_eq!(scope_of(&ScopeArgs { category: None }), TrashScope::all());
        assert_eq!(
            scope_of(&ScopeArgs {
                category: Some("Home".to_string())
            }),
            TrashScope::category("Home")
        );
    }
}
