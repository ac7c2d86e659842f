use pocketlife_core::db::open_db_in_memory;
use pocketlife_core::{
    LifecycleService, ManualClock, Note, NoteService, RecordFilter, RecordId, RecordStore,
    RepoError, RepoResult, SqliteNoteRepository, TrashScope,
};
use std::collections::HashSet;
use std::time::Duration;

const T0: i64 = 1_700_000_000_000;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Delegates to SQLite but refuses to delete selected ids.
struct FlakyNoteStore<'conn> {
    inner: SqliteNoteRepository<'conn>,
    undeletable: HashSet<RecordId>,
}

impl RecordStore for FlakyNoteStore<'_> {
    type Record = Note;

    fn fetch(&self, filter: &RecordFilter) -> RepoResult<Vec<Note>> {
        self.inner.fetch(filter)
    }

    fn fetch_ids(&self, filter: &RecordFilter) -> RepoResult<Vec<RepoResult<RecordId>>> {
        self.inner.fetch_ids(filter)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Note>> {
        self.inner.get(id)
    }

    fn insert(&self, record: &Note) -> RepoResult<RecordId> {
        self.inner.insert(record)
    }

    fn save(&self, record: &Note) -> RepoResult<()> {
        self.inner.save(record)
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        if self.undeletable.contains(&id) {
            return Err(RepoError::InvalidData(format!("delete refused for {id}")));
        }
        self.inner.delete(id)
    }
}

/// Store whose listing queries always fail.
struct UnlistableNoteStore<'conn> {
    inner: SqliteNoteRepository<'conn>,
}

impl RecordStore for UnlistableNoteStore<'_> {
    type Record = Note;

    fn fetch(&self, _filter: &RecordFilter) -> RepoResult<Vec<Note>> {
        Err(RepoError::InvalidData("listing unavailable".to_string()))
    }

    fn fetch_ids(&self, _filter: &RecordFilter) -> RepoResult<Vec<RepoResult<RecordId>>> {
        Err(RepoError::InvalidData("listing unavailable".to_string()))
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Note>> {
        self.inner.get(id)
    }

    fn insert(&self, record: &Note) -> RepoResult<RecordId> {
        self.inner.insert(record)
    }

    fn save(&self, record: &Note) -> RepoResult<()> {
        self.inner.save(record)
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        self.inner.delete(id)
    }
}

fn trashed_notes(
    conn: &rusqlite::Connection,
    clock: &ManualClock,
    count: usize,
) -> Vec<RecordId> {
    let repo = SqliteNoteRepository::try_new(conn).unwrap();
    let notes = NoteService::new(&repo, clock.clone());
    let lifecycle = LifecycleService::new(&repo, clock.clone());
    (0..count)
        .map(|index| {
            let note = notes
                .create_note(&format!("note {index}"), "", Some("Inbox"))
                .unwrap();
            lifecycle.soft_delete(note.id).unwrap();
            note.id
        })
        .collect()
}

#[test]
fn record_deleted_29_days_ago_survives_and_31_days_ago_is_purged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let clock = ManualClock::at(T0);
    let notes = NoteService::new(&repo, clock.clone());
    let lifecycle = LifecycleService::new(&repo, clock.clone());

    let note = notes.create_note("Old idea", "", None).unwrap();
    lifecycle.soft_delete(note.id).unwrap();

    clock.set(T0 + 29 * 86_400_000);
    let early = lifecycle.sweep_expired(RETENTION);
    assert_eq!(early.attempted, 0);
    assert!(repo.get(note.id).unwrap().is_some());

    clock.set(T0 + 31 * 86_400_000);
    let late = lifecycle.sweep_expired(RETENTION);
    assert_eq!(late.attempted, 1);
    assert_eq!(late.purged, 1);
    assert!(late.is_clean());
    assert!(repo.get(note.id).unwrap().is_none());
}

#[test]
fn retention_boundary_is_exclusive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let clock = ManualClock::at(T0);
    let notes = NoteService::new(&repo, clock.clone());
    let lifecycle = LifecycleService::new(&repo, clock.clone());

    let note = notes.create_note("Edge", "", None).unwrap();
    lifecycle.soft_delete(note.id).unwrap();

    clock.set(T0 + 30 * 86_400_000 - 1_000);
    assert_eq!(lifecycle.sweep_expired(RETENTION).purged, 0);

    clock.set(T0 + 30 * 86_400_000);
    assert_eq!(lifecycle.sweep_expired(RETENTION).purged, 0);
    assert!(repo.get(note.id).unwrap().is_some());

    clock.advance(Duration::from_secs(1));
    assert_eq!(lifecycle.sweep_expired(RETENTION).purged, 1);
    assert!(repo.get(note.id).unwrap().is_none());
}

#[test]
fn sweep_never_touches_active_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let clock = ManualClock::at(T0);
    let notes = NoteService::new(&repo, clock.clone());
    let lifecycle = LifecycleService::new(&repo, clock.clone());

    let kept = notes.create_note("Ancient but active", "", None).unwrap();
    clock.advance(RETENTION * 10);

    let report = lifecycle.sweep_expired(RETENTION);
    assert_eq!(report.attempted, 0);
    assert!(repo.get(kept.id).unwrap().is_some());
}

#[test]
fn failed_purge_does_not_stop_the_sweep() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::at(T0);
    let seed_repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let notes = NoteService::new(&seed_repo, clock.clone());
    let seed_lifecycle = LifecycleService::new(&seed_repo, clock.clone());

    let ids: Vec<RecordId> = (0..3)
        .map(|index| {
            let note = notes
                .create_note(&format!("note {index}"), "", None)
                .unwrap();
            seed_lifecycle.soft_delete(note.id).unwrap();
            note.id
        })
        .collect();
    let stuck = ids[1];

    let store = FlakyNoteStore {
        inner: SqliteNoteRepository::try_new(&conn).unwrap(),
        undeletable: HashSet::from([stuck]),
    };
    let lifecycle = LifecycleService::new(&store, clock.clone());
    clock.advance(RETENTION + DAY);

    let report = lifecycle.sweep_expired(RETENTION);

    assert_eq!(report.attempted, 3);
    assert_eq!(report.purged, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, Some(stuck));
    assert!(seed_repo.get(ids[0]).unwrap().is_none());
    assert!(seed_repo.get(stuck).unwrap().is_some());
    assert!(seed_repo.get(ids[2]).unwrap().is_none());

    // Next pass picks the survivor up again.
    let retry = lifecycle.sweep_expired(RETENTION);
    assert_eq!(retry.attempted, 1);
    assert_eq!(retry.failures.len(), 1);
}

#[test]
fn empty_trash_respects_category_scope() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let clock = ManualClock::at(T0);
    let notes = NoteService::new(&repo, clock.clone());
    let lifecycle = LifecycleService::new(&repo, clock);

    let work = notes.create_note("Standup", "", Some("Work")).unwrap();
    let home = notes.create_note("Laundry", "", Some("Home")).unwrap();
    let active = notes.create_note("Active work", "", Some("Work")).unwrap();
    lifecycle.soft_delete(work.id).unwrap();
    lifecycle.soft_delete(home.id).unwrap();

    let report = lifecycle.empty_trash(&TrashScope::category("work"));
    assert_eq!(report.attempted, 1);
    assert_eq!(report.purged, 1);
    assert!(repo.get(work.id).unwrap().is_none());
    assert!(repo.get(home.id).unwrap().is_some());
    assert!(repo.get(active.id).unwrap().is_some());

    let rest = lifecycle.empty_trash(&TrashScope::all());
    assert_eq!(rest.purged, 1);
    assert!(repo.get(home.id).unwrap().is_none());
    assert!(repo.get(active.id).unwrap().is_some());
}

#[test]
fn empty_trash_on_empty_trash_reports_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let lifecycle = LifecycleService::new(&repo, ManualClock::at(T0));

    let report = lifecycle.empty_trash(&TrashScope::all());

    assert_eq!(report.attempted, 0);
    assert_eq!(report.succeeded(), 0);
    assert!(report.is_clean());
}

#[test]
fn unreadable_row_does_not_block_expired_records() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::at(T0);
    let valid = trashed_notes(&conn, &clock, 1)[0];
    conn.execute(
        "INSERT INTO notes (uuid, title, is_deleted, deleted_at, created_at, updated_at)
         VALUES ('not-a-uuid', 'damaged', 1, ?1, ?1, ?1);",
        [T0],
    )
    .unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let lifecycle = LifecycleService::new(&repo, clock.clone());
    clock.advance(RETENTION + DAY);

    let report = lifecycle.sweep_expired(RETENTION);

    assert_eq!(report.attempted, 2);
    assert_eq!(report.purged, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, None);
    assert!(report.failures[0].error.contains("not-a-uuid"));
    assert!(repo.get(valid).unwrap().is_none());
}

#[test]
fn failing_snapshot_is_reported_not_raised() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::at(T0);
    let ids = trashed_notes(&conn, &clock, 2);
    let store = UnlistableNoteStore {
        inner: SqliteNoteRepository::try_new(&conn).unwrap(),
    };
    let lifecycle = LifecycleService::new(&store, clock.clone());
    clock.advance(RETENTION + DAY);

    for report in [
        lifecycle.sweep_expired(RETENTION),
        lifecycle.empty_trash(&TrashScope::all()),
    ] {
        assert_eq!(report.attempted, 0);
        assert_eq!(report.purged, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, None);
        assert!(report.failures[0].error.contains("listing unavailable"));
    }
    for id in ids {
        assert!(store.get(id).unwrap().is_some());
    }
}

#[test]
fn failed_purge_does_not_stop_emptying_the_trash() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::at(T0);
    let ids = trashed_notes(&conn, &clock, 3);
    let stuck = ids[0];
    let store = FlakyNoteStore {
        inner: SqliteNoteRepository::try_new(&conn).unwrap(),
        undeletable: HashSet::from([stuck]),
    };
    let lifecycle = LifecycleService::new(&store, clock);

    let report = lifecycle.empty_trash(&TrashScope::category("inbox"));

    assert_eq!(report.attempted, 3);
    assert_eq!(report.purged, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, Some(stuck));
    assert!(store.get(stuck).unwrap().is_some());
    assert!(store.get(ids[1]).unwrap().is_none());
    assert!(store.get(ids[2]).unwrap().is_none());
}
