//! Soft-delete lifecycle service.
//!
//! # Responsibility
//! - Move records between Active and Deleted, and purge Deleted records.
//! - Empty the trash and sweep records whose retention has expired.
//!
//! # Invariants
//! - Only the deletion state is mutated; payload fields are written back as
//!   read.
//! - Soft-deleting a deleted record keeps its original `deleted_at`.
//! - An Active record is never hard-deleted through this service.
//! - Batch operations snapshot their targets before the first purge and
//!   never stop on a per-record failure.
//!
//! # Concurrency
//! A sweep racing a user restore of the same record resolves as
//! last-write-wins in the store. Each `save`/`delete` is atomic on its own;
//! nothing here spans records.

use crate::clock::{duration_to_ms, Clock, SystemClock};
use crate::model::deletion::{DeletableRecord, RecordId, RecordKind};
use crate::repo::{RecordFilter, RecordStore, RepoError, TrashScope};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Errors from single-record lifecycle operations.
#[derive(Debug)]
pub enum LifecycleError {
    /// Target record does not exist.
    NotFound(RecordId),
    /// Target record is not in the state the operation requires.
    InvalidState {
        id: RecordId,
        expected: &'static str,
    },
    /// The store failed to read or write.
    Persistence(RepoError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidState { id, expected } => {
                write!(f, "record {id} must be {expected} for this operation")
            }
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

/// Result of a single `purge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Purged,
    /// The record was already gone, so the purge is satisfied.
    AlreadyAbsent,
}

/// One record a batch operation could not purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeFailure {
    /// `None` when no id is known: the snapshot fetch itself failed, or the
    /// row's id could not be read.
    pub id: Option<RecordId>,
    pub error: String,
}

/// Aggregate outcome of `empty_trash` or `sweep_expired`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub kind: RecordKind,
    /// Snapshot entries, unreadable rows included.
    pub attempted: usize,
    pub purged: usize,
    /// Snapshot records that vanished before their purge ran.
    pub already_absent: usize,
    pub failures: Vec<PurgeFailure>,
}

impl SweepReport {
    fn empty(kind: RecordKind) -> Self {
        Self {
            kind,
            attempted: 0,
            purged: 0,
            already_absent: 0,
            failures: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.purged + self.already_absent
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Lifecycle manager over one record kind.
pub struct LifecycleService<S: RecordStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: RecordStore> LifecycleService<S, SystemClock> {
    /// Creates a service stamping deletions with the wall clock.
    pub fn with_system_clock(store: S) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<S: RecordStore, C: Clock> LifecycleService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn kind(&self) -> RecordKind {
        <S::Record as DeletableRecord>::KIND
    }

    /// Moves an Active record to the trash, stamping `deleted_at = now`.
    ///
    /// Already deleted records are returned unchanged.
    pub fn soft_delete(&self, id: RecordId) -> Result<S::Record, LifecycleError> {
        let mut record = self.store.get(id)?.ok_or(LifecycleError::NotFound(id))?;
        if record.is_deleted() {
            debug!(
                "event=record_soft_delete module=lifecycle status=noop kind={} id={}",
                self.kind(),
                id
            );
            return Ok(record);
        }

        let now_ms = self.clock.now_ms();
        record.set_deletion(record.deletion().soft_deleted(now_ms));
        self.persist(&record, "record_soft_delete")?;
        info!(
            "event=record_soft_delete module=lifecycle status=ok kind={} id={} deleted_at={}",
            self.kind(),
            id,
            now_ms
        );
        Ok(record)
    }

    /// Moves a Deleted record back to Active.
    ///
    /// Returns `None` when the record no longer exists; Active records are
    /// returned unchanged.
    pub fn restore(&self, id: RecordId) -> Result<Option<S::Record>, LifecycleError> {
        let Some(mut record) = self.store.get(id)? else {
            debug!(
                "event=record_restore module=lifecycle status=noop kind={} id={} reason=absent",
                self.kind(),
                id
            );
            return Ok(None);
        };
        if !record.is_deleted() {
            return Ok(Some(record));
        }

        record.set_deletion(record.deletion().restored());
        match self.persist(&record, "record_restore") {
            Ok(()) => {}
            Err(LifecycleError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        }
        info!(
            "event=record_restore module=lifecycle status=ok kind={} id={}",
            self.kind(),
            id
        );
        Ok(Some(record))
    }

    /// Permanently removes a Deleted record.
    ///
    /// # Errors
    /// - `InvalidState` when the record is still Active; nothing is deleted.
    /// - `Persistence` when the store fails.
    pub fn purge(&self, id: RecordId) -> Result<PurgeOutcome, LifecycleError> {
        let Some(record) = self.store.get(id)? else {
            return Ok(PurgeOutcome::AlreadyAbsent);
        };
        if !record.is_deleted() {
            warn!(
                "event=record_purge module=lifecycle status=error kind={} id={} error_code=record_active",
                self.kind(),
                id
            );
            return Err(LifecycleError::InvalidState {
                id,
                expected: "deleted",
            });
        }

        let outcome = self.delete_one(id)?;
        info!(
            "event=record_purge module=lifecycle status=ok kind={} id={} outcome={:?}",
            self.kind(),
            id,
            outcome
        );
        Ok(outcome)
    }

    /// Purges every Deleted record within `scope`.
    pub fn empty_trash(&self, scope: &TrashScope) -> SweepReport {
        let filter = RecordFilter::deleted().within(scope);
        self.purge_snapshot("trash_empty", &filter)
    }

    /// Purges Deleted records whose age exceeds `retention`.
    ///
    /// A record deleted exactly `retention` ago is kept. Never fails; store
    /// errors end up in the report.
    pub fn sweep_expired(&self, retention: Duration) -> SweepReport {
        let cutoff_ms = self
            .clock
            .now_ms()
            .saturating_sub(duration_to_ms(retention));
        self.purge_snapshot("trash_sweep", &RecordFilter::expired(cutoff_ms))
    }

    fn purge_snapshot(&self, event: &'static str, filter: &RecordFilter) -> SweepReport {
        let started_at = Instant::now();
        let mut report = SweepReport::empty(self.kind());

        let snapshot = match self.store.fetch_ids(filter) {
            Ok(entries) => entries,
            Err(err) => {
                error!(
                    "event={} module=lifecycle status=error kind={} error_code=snapshot_failed error={}",
                    event,
                    self.kind(),
                    err
                );
                report.failures.push(PurgeFailure {
                    id: None,
                    error: err.to_string(),
                });
                return report;
            }
        };

        report.attempted = snapshot.len();
        for entry in snapshot {
            let id = match entry {
                Ok(id) => id,
                Err(err) => {
                    warn!(
                        "event={} module=lifecycle status=error kind={} error_code=unreadable_row error={}",
                        event,
                        self.kind(),
                        err
                    );
                    report.failures.push(PurgeFailure {
                        id: None,
                        error: err.to_string(),
                    });
                    continue;
                }
            };
            match self.delete_one(id) {
                Ok(PurgeOutcome::Purged) => report.purged += 1,
                Ok(PurgeOutcome::AlreadyAbsent) => report.already_absent += 1,
                Err(err) => {
                    warn!(
                        "event={} module=lifecycle status=error kind={} id={} error={}",
                        event,
                        self.kind(),
                        id,
                        err
                    );
                    report.failures.push(PurgeFailure {
                        id: Some(id),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            "event={} module=lifecycle status={} kind={} attempted={} purged={} already_absent={} failed={} duration_ms={}",
            event,
            if report.is_clean() { "ok" } else { "partial" },
            self.kind(),
            report.attempted,
            report.purged,
            report.already_absent,
            report.failures.len(),
            started_at.elapsed().as_millis()
        );
        report
    }

    fn delete_one(&self, id: RecordId) -> Result<PurgeOutcome, LifecycleError> {
        match self.store.delete(id) {
            Ok(()) => Ok(PurgeOutcome::Purged),
            Err(RepoError::NotFound(_)) => Ok(PurgeOutcome::AlreadyAbsent),
            Err(err) => Err(LifecycleError::Persistence(err)),
        }
    }

    fn persist(&self, record: &S::Record, event: &'static str) -> Result<(), LifecycleError> {
        self.store.save(record).map_err(|err| {
            error!(
                "event={} module=lifecycle status=error kind={} id={} error={}",
                event,
                self.kind(),
                record.id(),
                err
            );
            LifecycleError::from(err)
        })
    }
}
