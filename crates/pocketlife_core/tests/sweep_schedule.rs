use pocketlife_core::db::{open_db, open_db_in_memory};
use pocketlife_core::{
    BudgetEntryRequest, BudgetService, EntryKind, LifecycleService, ManualClock, NoteService,
    PeriodicSweep, RecordKind, RecordStore, SqliteBudgetRepository, SqliteNoteRepository,
    SweepSchedule, SystemClock,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const T0: i64 = 1_700_000_000_000;
const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[test]
fn startup_sweep_covers_every_registered_kind() {
    let conn = open_db_in_memory().unwrap();
    let note_repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let budget_repo = SqliteBudgetRepository::try_new(&conn).unwrap();
    let clock = ManualClock::at(T0);

    let note = NoteService::new(&note_repo, clock.clone())
        .create_note("Stale", "", None)
        .unwrap();
    let item = BudgetService::new(&budget_repo, clock.clone())
        .record_entry(&BudgetEntryRequest {
            title: "Snacks".to_string(),
            amount_cents: 300,
            kind: EntryKind::Expense,
            category: None,
        })
        .unwrap();

    let note_lifecycle = LifecycleService::new(&note_repo, clock.clone());
    let budget_lifecycle = LifecycleService::new(&budget_repo, clock.clone());
    note_lifecycle.soft_delete(note.id).unwrap();
    budget_lifecycle.soft_delete(item.id).unwrap();

    let mut schedule = SweepSchedule::new(RETENTION);
    schedule
        .register(&note_lifecycle)
        .register(&budget_lifecycle);

    let first = schedule.on_application_start();
    assert_eq!(first.iter().map(|report| report.purged).sum::<usize>(), 0);

    clock.advance(RETENTION + Duration::from_secs(1));
    let second = schedule.on_interval();
    let kinds: Vec<_> = second.iter().map(|report| report.kind).collect();
    assert_eq!(kinds, vec![RecordKind::Note, RecordKind::BudgetItem]);
    assert!(second.iter().all(|report| report.purged == 1));
    assert!(note_repo.get(note.id).unwrap().is_none());
    assert!(budget_repo.get(item.id).unwrap().is_none());
}

#[test]
fn periodic_sweep_owns_its_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pocketlife.db");

    let conn = open_db(&path).unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let notes = NoteService::new(&repo, ManualClock::at(T0));
    let lifecycle = LifecycleService::new(&repo, ManualClock::at(T0));
    let note = notes.create_note("Expired long ago", "", None).unwrap();
    lifecycle.soft_delete(note.id).unwrap();

    let sweeps = Arc::new(AtomicUsize::new(0));
    let job_sweeps = Arc::clone(&sweeps);
    let job_conn = open_db(&path).unwrap();
    let task = PeriodicSweep::spawn(Duration::from_millis(10), move || {
        let Ok(repo) = SqliteNoteRepository::try_new(&job_conn) else {
            return;
        };
        let lifecycle = LifecycleService::new(&repo, SystemClock);
        let report = lifecycle.sweep_expired(RETENTION);
        job_sweeps.fetch_add(report.purged, Ordering::SeqCst);
    })
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while sweeps.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    let stats = task.stop();

    assert!(stats.runs >= 1);
    assert_eq!(sweeps.load(Ordering::SeqCst), 1);
    assert!(repo.get(note.id).unwrap().is_none());
}
